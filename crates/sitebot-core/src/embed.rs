/// Marker a site owner replaces with the address their chatbot is served
/// from.
pub const SERVER_URL_PLACEHOLDER: &str = "YOUR_SERVER_URL";

/// Self-contained snippet a third-party page pastes in to get the floating
/// chat launcher plus the (initially hidden) chat iframe. Static markup:
/// nothing here depends on live state beyond the two inputs.
pub fn generate_embed_code(chatbot_id: &str, company_name: &str) -> String {
    format!(
        r#"<!-- {company_name} AI Chatbot -->
<div id="chatbot-{chatbot_id}"></div>
<script>
(function(){{
  var btn=document.createElement('button');
  btn.innerHTML='Chat';
  btn.style.cssText='position:fixed;bottom:20px;right:20px;background:#0066cc;color:white;border:none;border-radius:50px;padding:15px 25px;font-size:16px;cursor:pointer;box-shadow:0 4px 12px rgba(0,0,0,0.3);z-index:9999;';

  var iframe=document.createElement('iframe');
  iframe.src='{SERVER_URL_PLACEHOLDER}?id={chatbot_id}';
  iframe.style.cssText='position:fixed;bottom:80px;right:20px;width:400px;height:600px;border:none;border-radius:10px;box-shadow:0 8px 24px rgba(0,0,0,0.4);z-index:9998;display:none;';

  btn.onclick=function(){{
    iframe.style.display=iframe.style.display==='none'?'block':'none';
  }};

  document.body.appendChild(btn);
  document.body.appendChild(iframe);
}})();
</script>"#
    )
}
