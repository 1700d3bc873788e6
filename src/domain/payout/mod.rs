//! Payout parsing and aggregation
//!
//! Pure functions shared by the heist cogs: numeric token parsing, number
//! formatting, and announcement detection over single messages or batches.

pub mod amount;
pub mod detector;
pub mod format;

pub use amount::{parse_currency_value, parse_plain_count, NumericToken, Scale, CURRENCY_GLYPH};
pub use detector::{
    detect_payout, scan_for_payouts, DetectedPayout, PayoutAnnouncement, PayoutDetection,
    TRIGGER_PHRASE,
};
pub use format::{format_abbreviated, format_grouped};
