//! Domain layer - Core business logic with no platform dependencies
//! 
//! This layer contains:
//! - Entities: Messages, embeds, guild settings, spree channels
//! - Traits: Abstractions for infrastructure (Bot, Store)
//! - Payout: Announcement parsing and number formatting
//! - Duration: Countdown string parsing
//! - Card: Layout of the payout image card

pub mod card;
pub mod duration;
pub mod entities;
pub mod payout;
pub mod traits;
