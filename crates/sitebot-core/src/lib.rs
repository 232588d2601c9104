pub mod chatbot;
pub mod config;
pub mod embed;
pub mod engine;
pub mod lead;
pub mod session;
pub mod storage;

pub use chatbot::*;
pub use config::*;
pub use embed::*;
pub use engine::*;
pub use lead::*;
pub use session::*;
pub use storage::*;
