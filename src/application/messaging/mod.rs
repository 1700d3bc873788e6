//! Message handling - Event-driven message processing

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{Event, EventDispatcher};
pub use parser::{CommandArgs, MessageParser};
