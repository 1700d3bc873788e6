//! heist-bot: payout calculator, heist summaries and temporary channels

pub mod application;
pub mod cogs;
pub mod domain;
pub mod infrastructure;
