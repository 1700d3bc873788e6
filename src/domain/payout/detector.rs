//! Payout announcement detection
//!
//! A message qualifies when it carries the trigger phrase; its lines are then
//! scanned for the "racked up a total" amount and the "N users got the payout"
//! count. When several lines match, the last one wins.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::amount::{parse_currency_value, parse_plain_count, CURRENCY_GLYPH};
use crate::domain::entities::CandidateMessage;

/// Phrase the payout bot uses in every payout announcement
pub const TRIGGER_PHRASE: &str = "amazing job everybody";

static TOTAL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)racked up a total.*?⏣\s*([\d,.kmb]+)").expect("total pattern is valid")
});

static COUNT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d,.]+)\s+users? got the payout").expect("count pattern is valid")
});

static MARKDOWN_EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[`*]+").expect("emphasis pattern is valid"));

/// Numbers extracted from one announcement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoutDetection {
    pub total_amount: f64,
    pub recipient_count: u64,
    pub per_recipient_share: f64,
}

/// A detection tied to the message it came from
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutAnnouncement {
    pub source_message_id: String,
    pub total_amount: f64,
    pub recipient_count: u64,
}

impl PayoutAnnouncement {
    pub fn per_recipient_share(&self) -> f64 {
        self.total_amount / self.recipient_count as f64
    }
}

/// Result of a batch scan: the source message and what was found in it
#[derive(Debug, Clone)]
pub struct DetectedPayout {
    pub message: CandidateMessage,
    pub detection: PayoutDetection,
}

impl DetectedPayout {
    pub fn announcement(&self) -> PayoutAnnouncement {
        PayoutAnnouncement {
            source_message_id: self.message.id.clone(),
            total_amount: self.detection.total_amount,
            recipient_count: self.detection.recipient_count,
        }
    }
}

/// Decides whether `text` is a payout announcement and extracts its numbers.
///
/// Returns `None` for messages without the trigger phrase and for announcements
/// missing the total or the recipient count.
pub fn detect_payout(text: &str) -> Option<PayoutDetection> {
    if !text.to_lowercase().contains(TRIGGER_PHRASE) {
        return None;
    }

    let mut total_amount: Option<f64> = None;
    let mut recipient_count: Option<u64> = None;

    for line in text.trim().lines() {
        let clean = MARKDOWN_EMPHASIS.replace_all(line, "");
        let clean = clean.trim();

        if let Some(caps) = TOTAL_LINE.captures(clean) {
            let token = format!("{} {}", CURRENCY_GLYPH, &caps[1]);
            if let Some(value) = parse_currency_value(&token) {
                total_amount = Some(value);
            }
        }

        if let Some(caps) = COUNT_LINE.captures(clean) {
            if let Some(count) = parse_plain_count(&caps[1]) {
                recipient_count = Some(count as u64);
            }
        }
    }

    match (total_amount, recipient_count) {
        (Some(total_amount), Some(recipient_count)) if recipient_count > 0 => {
            Some(PayoutDetection {
                total_amount,
                recipient_count,
                per_recipient_share: total_amount / recipient_count as f64,
            })
        }
        _ => {
            tracing::debug!("trigger phrase found but no payout data");
            None
        }
    }
}

/// Collects up to `limit` detections from `messages` (newest first) and
/// returns them oldest first.
pub fn scan_for_payouts<I>(messages: I, limit: usize) -> Vec<DetectedPayout>
where
    I: IntoIterator<Item = CandidateMessage>,
{
    let mut found = Vec::new();
    if limit == 0 {
        return found;
    }

    for message in messages {
        if let Some(detection) = detect_payout(&message.text) {
            found.push(DetectedPayout { message, detection });
            if found.len() >= limit {
                break;
            }
        }
    }

    found.reverse();
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANNOUNCEMENT: &str = "Amazing job everybody!\n\
        The crew **racked up a total of** `⏣ 1,000` coins\n\
        **2** users got the payout";

    fn candidate(id: &str, text: &str) -> CandidateMessage {
        CandidateMessage::new(id, "chan", "author", text)
    }

    #[test]
    fn test_detects_announcement() {
        let detection = detect_payout(ANNOUNCEMENT).unwrap();
        assert_eq!(detection.total_amount, 1000.0);
        assert_eq!(detection.recipient_count, 2);
        assert_eq!(detection.per_recipient_share, 500.0);
    }

    #[test]
    fn test_scaled_total() {
        let text = "amazing job everybody\nyou racked up a total of ⏣ 1.5m\n3 users got the payout";
        let detection = detect_payout(text).unwrap();
        assert_eq!(detection.total_amount, 1_500_000.0);
        assert_eq!(detection.per_recipient_share, 500_000.0);
    }

    #[test]
    fn test_requires_trigger_phrase() {
        let text = "racked up a total of ⏣ 1,000\n2 users got the payout";
        assert_eq!(detect_payout(text), None);
    }

    #[test]
    fn test_trigger_without_data() {
        assert_eq!(detect_payout("Amazing job everybody! Nothing else here."), None);
        assert_eq!(
            detect_payout("Amazing job everybody!\nracked up a total of ⏣ 1,000"),
            None
        );
    }

    #[test]
    fn test_zero_recipients_is_absent() {
        let text = "Amazing job everybody\nracked up a total of ⏣ 1,000\n0 users got the payout";
        assert_eq!(detect_payout(text), None);
    }

    #[test]
    fn test_single_user_wording() {
        let text = "Amazing job everybody\nracked up a total of ⏣ 750\n1 user got the payout";
        assert_eq!(detect_payout(text).unwrap().per_recipient_share, 750.0);
    }

    #[test]
    fn test_last_matching_line_wins() {
        let text = "Amazing job everybody\n\
            racked up a total of ⏣ 100\n\
            4 users got the payout\n\
            racked up a total of ⏣ 900\n\
            3 users got the payout";
        let detection = detect_payout(text).unwrap();
        assert_eq!(detection.total_amount, 900.0);
        assert_eq!(detection.recipient_count, 3);
    }

    #[test]
    fn test_share_reconstructs_total() {
        for count in 1..50u64 {
            let text = format!(
                "Amazing job everybody\nracked up a total of ⏣ 1,234,567\n{} users got the payout",
                count
            );
            let detection = detect_payout(&text).unwrap();
            let rebuilt = detection.per_recipient_share * detection.recipient_count as f64;
            assert!((rebuilt - detection.total_amount).abs() < 1e-6);
        }
    }

    #[test]
    fn test_scan_limit_and_order() {
        // Newest first, qualifying messages at 1, 4 and 7.
        let messages: Vec<CandidateMessage> = (0..10)
            .map(|i| {
                let id = format!("m{}", i);
                if i % 3 == 1 {
                    let text = format!(
                        "Amazing job everybody\nracked up a total of ⏣ {}k\n2 users got the payout",
                        i
                    );
                    candidate(&id, &text)
                } else {
                    candidate(&id, "just chatting")
                }
            })
            .collect();

        let found = scan_for_payouts(messages, 2);
        let ids: Vec<&str> = found.iter().map(|f| f.message.id.as_str()).collect();
        assert_eq!(ids, vec!["m4", "m1"]);
        assert_eq!(found[1].announcement().total_amount, 1000.0);
    }

    #[test]
    fn test_scan_with_zero_limit() {
        let messages = vec![candidate("a", ANNOUNCEMENT)];
        assert!(scan_for_payouts(messages, 0).is_empty());
    }

    #[test]
    fn test_announcement_share() {
        let announcement = PayoutAnnouncement {
            source_message_id: "1".to_string(),
            total_amount: 900.0,
            recipient_count: 3,
        };
        assert_eq!(announcement.per_recipient_share(), 300.0);
    }
}
