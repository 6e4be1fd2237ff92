//! Torcida core library: payload normalization, intent classification, dialogue
//! state and the HTTP gateway used by the CLI.

pub mod assistant;
pub mod channels;
pub mod config;
pub mod dialogue;
pub mod gateway;
pub mod init;
pub mod llm;
pub mod nlu;
pub mod providers;
pub mod state;
