/// Lobby Console - drive a lobby session from a terminal
pub mod command;
pub mod config;
pub mod error;

pub use error::{ConsoleError, Result};
