//! Domain entities - Core business objects with no platform dependencies

pub mod channel;
pub mod command;
pub mod embed;
pub mod guild;
pub mod message;
pub mod settings;
pub mod spree;
pub mod user;

pub use channel::{ChannelInfo, ChannelKind};
pub use command::{Command, CommandKind, CommandRegistry, Permission};
pub use embed::{Color, Embed, Footer};
pub use guild::GuildInfo;
pub use message::{CandidateMessage, Content, Message};
pub use settings::{GuildCalculatorSettings, HeistSettings, Template};
pub use spree::{deadline_after, SpreeChannel, SpreeState};
pub use user::User;
