use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sitebot_core::{
    generate_chatbot_id, handle_form_action, handle_message, Chatbot, FormAction, MemoryStore,
    SessionContext, Settings, StepOutcome,
};
use sitebot_provider::CompletionClient;
use sitebot_schema::company_slug;

#[derive(Parser)]
#[command(name = "sitebot", version, about = "Website chatbot with lead capture")]
struct Cli {
    #[arg(long, help = "Path to a settings YAML file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the HTTP API server")]
    Serve {
        #[arg(long, help = "Override the configured port")]
        port: Option<u16>,
    },
    #[command(about = "Scrape one site and chat with its bot in the terminal")]
    Chat {
        #[arg(long, help = "Company name shown in replies")]
        company: String,
        #[arg(long, help = "Website URL to scrape")]
        url: String,
    },
    #[command(about = "Validate the settings file")]
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitebot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(settings.server.port);
            let addr = format!("{}:{}", settings.server.host, port);
            if !settings.llm_enabled() {
                tracing::warn!(
                    "no API key configured; model answers are disabled, scraping still works"
                );
            }
            let state = sitebot_server::AppState::new(settings);
            sitebot_server::serve(state, &addr).await
        }
        Commands::Chat { company, url } => run_chat(settings, company, url).await,
        Commands::Validate => {
            println!(
                "settings ok (api key {}, server {}:{})",
                if settings.llm_enabled() { "set" } else { "not set" },
                settings.server.host,
                settings.server.port,
            );
            Ok(())
        }
    }
}

/// Local REPL: the whole flow — scrape, chat, lead form — without a browser.
async fn run_chat(settings: Settings, company: String, url: String) -> Result<()> {
    let completion = CompletionClient::with_base(
        settings.api_key.clone(),
        settings.api_base.clone(),
        settings.model.clone(),
    );
    let store = MemoryStore::new();

    let chatbot_id = generate_chatbot_id(&company, &url);
    let mut bot = Chatbot::new(&company, &url, &chatbot_id);

    println!("Scraping {url} ...");
    let report = |done: usize, total: usize, url: &str| {
        println!("  [{done}/{total}] {url}");
    };
    bot.initialize(Some(&report)).await?;
    println!(
        "Ready: {} pages, {} emails, {} phones. Type a question, or 'quit'.\n",
        bot.pages().len(),
        bot.contact_info().emails.len(),
        bot.contact_info().phones.len(),
    );

    let mut session = SessionContext::new();
    session.switch_chatbot(company_slug(&company));

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        if session.capture.is_capturing() {
            if let Some(prompt) = session.capture.prompt() {
                print!("{prompt} (or 'skip'): ");
            }
        } else {
            print!("> ");
        }
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") {
            break;
        }

        if session.capture.is_capturing() {
            let action = if input.eq_ignore_ascii_case("skip") {
                FormAction::Skip
            } else {
                FormAction::Submit(input.to_string())
            };
            match handle_form_action(&mut session, &bot, action, &store) {
                Ok(StepOutcome::Next(_)) => {}
                Ok(StepOutcome::Captured { lead_id }) => {
                    println!("Thanks! Lead #{lead_id} recorded. Back to the chat.\n");
                }
                Err(err) => println!("{err}"),
            }
            continue;
        }

        let reply = handle_message(&mut session, &bot, input, &completion).await;
        println!("{}\n", reply.answer);
        if reply.capture_started {
            println!("Before we continue, a quick form.");
        }
    }

    Ok(())
}
