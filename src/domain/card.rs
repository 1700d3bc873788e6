//! Layout of the payout image card
//!
//! The card is the guild icon scaled to a square canvas, darkened towards the
//! bottom, with two centred text lines on a black rounded rectangle. Only the
//! geometry lives here; `infrastructure::render` rasterizes it.

use crate::domain::payout::format_abbreviated;

pub const CANVAS_SIZE: i32 = 256;
const DARK_ZONE_RATIO: f32 = 0.3;
const DARK_ZONE_MAX_ALPHA: f32 = 0.7;
const LINE_GAP: i32 = 5;
const BOTTOM_MARGIN: i32 = 35;
const RECT_PAD_X: i32 = 92;
const RECT_PAD_Y: i32 = 35;
const RECT_RAISE: i32 = 5;
const CORNER_RADIUS: i32 = 10;

/// Grey used when the guild has no usable icon
pub const BLANK_ICON_RGB: (u8, u8, u8) = (50, 50, 50);

/// Measures rendered text, in pixels
pub trait TextMetrics {
    fn measure(&self, text: &str) -> (i32, i32);
}

/// Fixed advance per glyph, close to a small simplex font
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    pub advance: i32,
    pub height: i32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { advance: 9, height: 11 }
    }
}

impl TextMetrics for FixedAdvance {
    fn measure(&self, text: &str) -> (i32, i32) {
        (text.chars().count() as i32 * self.advance, self.height)
    }
}

/// Guild icon drawn as the card background
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildIcon {
    /// Plain grey square
    Blank,
    /// Encoded image bytes as downloaded
    Encoded(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundedRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub radius: i32,
}

impl RoundedRect {
    /// Clamps the radius to half of the smaller side
    fn new(left: i32, top: i32, right: i32, bottom: i32, radius: i32) -> Self {
        let radius = radius.min((right - left) / 2).min((bottom - top) / 2).max(0);
        Self { left, top, right, bottom, radius }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// A text line and the baseline origin it is drawn at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedText {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLayout {
    pub background: RoundedRect,
    pub lines: [PlacedText; 2],
    /// First canvas row of the darkened zone
    pub dark_zone_top: i32,
}

impl CardLayout {
    /// Darkening factor for `row`; 1.0 outside the dark zone
    pub fn row_factor(&self, row: i32) -> f32 {
        let zone = CANVAS_SIZE - self.dark_zone_top;
        if row < self.dark_zone_top || row >= CANVAS_SIZE || zone <= 0 {
            return 1.0;
        }
        if zone == 1 {
            return DARK_ZONE_MAX_ALPHA;
        }
        let step = (row - self.dark_zone_top) as f32 / (zone - 1) as f32;
        DARK_ZONE_MAX_ALPHA * (1.0 - step)
    }
}

/// Everything needed to draw a payout card
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutCard {
    pub recipients: u64,
    pub share: f64,
    pub icon: GuildIcon,
    pub layout: CardLayout,
}

impl PayoutCard {
    pub fn new(recipients: u64, share: f64, icon: GuildIcon, metrics: &dyn TextMetrics) -> Self {
        let first = format!("{} user(s)", recipients);
        let second = format!("each got: {}", format_abbreviated(share));
        let layout = Self::layout(first, second, metrics);
        Self { recipients, share, icon, layout }
    }

    fn layout(first: String, second: String, metrics: &dyn TextMetrics) -> CardLayout {
        let (w1, h1) = metrics.measure(&first);
        let (w2, h2) = metrics.measure(&second);
        let text_height = h1 + h2 + LINE_GAP;

        let center_x = CANVAS_SIZE / 2;
        let start_y = CANVAS_SIZE - text_height - BOTTOM_MARGIN;

        let rect_width = w1.max(w2) + RECT_PAD_X;
        let rect_height = text_height + RECT_PAD_Y;
        let rect_left = center_x - rect_width / 2;
        let rect_top = start_y - RECT_RAISE;

        let first_y = start_y + h1;
        let second_y = first_y + h2 + LINE_GAP;

        CardLayout {
            background: RoundedRect::new(
                rect_left,
                rect_top,
                rect_left + rect_width,
                rect_top + rect_height,
                CORNER_RADIUS,
            ),
            lines: [
                PlacedText { text: first, x: center_x - w1 / 2, y: first_y },
                PlacedText { text: second, x: center_x - w2 / 2, y: second_y },
            ],
            dark_zone_top: CANVAS_SIZE - (CANVAS_SIZE as f32 * DARK_ZONE_RATIO) as i32,
        }
    }
}
