//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod store;

pub use bot::{Bot, BotInfo, ButtonStyle, KeyboardButton};
pub use store::Store;
