//! Payout card rasterization
//!
//! Paints a `PayoutCard` over the guild icon and encodes the result as PNG.
//! Text needs a TrueType font: the configured one, or the first well-known
//! system font that loads.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::application::errors::BotError;
use crate::domain::card::{
    CardLayout, FixedAdvance, GuildIcon, PayoutCard, RoundedRect, TextMetrics, BLANK_ICON_RGB, CANVAS_SIZE,
};

/// Attachment name of a rendered card
pub const CARD_FILE_NAME: &str = "heist_payout.png";

const TEXT_SCALE: f32 = 18.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const BACKDROP_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Turns payout cards into PNG bytes
pub struct CardRenderer {
    font: Option<FontArc>,
    fallback: FixedAdvance,
}

impl CardRenderer {
    /// Renderer that can lay cards out but not draw their text
    pub fn without_font() -> Self {
        Self {
            font: None,
            fallback: FixedAdvance::default(),
        }
    }

    pub fn from_font_file(path: &Path) -> Result<Self, BotError> {
        let bytes = std::fs::read(path)
            .map_err(|e| BotError::Render(format!("Failed to read font {}: {}", path.display(), e)))?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| BotError::Render(format!("Invalid font {}: {}", path.display(), e)))?;
        Ok(Self {
            font: Some(font),
            fallback: FixedAdvance::default(),
        })
    }

    /// The configured font first, then the system fonts
    pub fn discover(configured: Option<&Path>) -> Self {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_font_file(&path) {
                Ok(renderer) => {
                    info!("Payout cards use font {}", path.display());
                    return renderer;
                }
                Err(e) => warn!("{}", e),
            }
        }

        warn!("No usable font found; image payouts will be sent as embeds");
        Self::without_font()
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn render(&self, card: &PayoutCard) -> Result<Vec<u8>, BotError> {
        let font = self
            .font
            .as_ref()
            .ok_or_else(|| BotError::Render("No font loaded for payout cards".to_string()))?;

        let mut canvas = paint(card);
        let scale = PxScale::from(TEXT_SCALE);
        let ascent = font.as_scaled(scale).ascent().round() as i32;
        for line in &card.layout.lines {
            draw_text_mut(&mut canvas, TEXT_COLOR, line.x, line.y - ascent, scale, font, &line.text);
        }

        encode_png(canvas)
    }
}

impl TextMetrics for CardRenderer {
    fn measure(&self, text: &str) -> (i32, i32) {
        match &self.font {
            Some(font) => {
                let (width, height) = text_size(PxScale::from(TEXT_SCALE), font, text);
                (width as i32, height as i32)
            }
            None => self.fallback.measure(text),
        }
    }
}

/// Background, dark zone and text backdrop of a card
pub fn paint(card: &PayoutCard) -> RgbImage {
    let mut canvas = background(&card.icon);
    darken(&mut canvas, &card.layout);
    fill_rounded_rect(&mut canvas, &card.layout.background, BACKDROP_COLOR);
    canvas
}

pub fn encode_png(canvas: RgbImage) -> Result<Vec<u8>, BotError> {
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| BotError::Render(format!("Failed to encode card: {}", e)))?;
    Ok(png)
}

fn background(icon: &GuildIcon) -> RgbImage {
    let size = CANVAS_SIZE as u32;
    let (r, g, b) = BLANK_ICON_RGB;
    let blank = || RgbImage::from_pixel(size, size, Rgb([r, g, b]));

    match icon {
        GuildIcon::Blank => blank(),
        GuildIcon::Encoded(bytes) => match image::load_from_memory(bytes) {
            Ok(decoded) => decoded.resize_exact(size, size, FilterType::Triangle).to_rgb8(),
            Err(e) => {
                warn!("Could not decode guild icon, using blank image: {}", e);
                blank()
            }
        },
    }
}

fn darken(canvas: &mut RgbImage, layout: &CardLayout) {
    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        let factor = layout.row_factor(y as i32);
        if factor < 1.0 {
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as f32 * factor).round() as u8;
            }
        }
    }
}

fn fill_rounded_rect(canvas: &mut RgbImage, rect: &RoundedRect, color: Rgb<u8>) {
    let r = rect.radius;
    let corners = [
        (rect.left + r, rect.top + r),
        (rect.right - r, rect.top + r),
        (rect.left + r, rect.bottom - r),
        (rect.right - r, rect.bottom - r),
    ];
    if r > 0 {
        for center in corners {
            draw_filled_circle_mut(canvas, center, r, color);
        }
    }
    fill_rect(canvas, rect.left + r, rect.top, rect.right - r, rect.bottom, color);
    fill_rect(canvas, rect.left, rect.top + r, rect.right, rect.bottom - r, color);
}

fn fill_rect(canvas: &mut RgbImage, left: i32, top: i32, right: i32, bottom: i32, color: Rgb<u8>) {
    if right > left && bottom > top {
        let area = Rect::at(left, top).of_size((right - left) as u32, (bottom - top) as u32);
        draw_filled_rect_mut(canvas, area, color);
    }
}
