//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Data persistence
//! - Icons: Guild icon download and caching
//! - Render: Payout card images
//! - Adapters: Platform integrations

pub mod adapters;
pub mod config;
pub mod icons;
pub mod render;
pub mod storage;
