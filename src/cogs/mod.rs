//! Cogs - feature modules with their own commands and listeners

pub mod heist_calculator;
pub mod heist_summary;
pub mod manager;
pub mod spree;
pub mod trait_def;

pub use heist_calculator::HeistCalculatorCog;
pub use heist_summary::HeistSummaryCog;
pub use manager::{CogInfo, CogManager};
pub use spree::SpreeCog;
pub use trait_def::{ButtonPress, Cog, CogContext, Invocation, Reply};
