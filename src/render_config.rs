use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_TEXT_COLOR: HexColor = HexColor([0x00, 0xff, 0x00]);
pub const DEFAULT_BACKGROUND_COLOR: HexColor = HexColor([0x00, 0x00, 0x00]);
pub const DEFAULT_TRAIL_OPACITY: f64 = 0.05;
pub const DEFAULT_FRAMES_PER_SECOND: f64 = 30.0;

/// An opaque RGB color written as `#rrggbb`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexColor(pub [u8; 3]);

#[derive(Error, Debug, PartialEq, Eq)]
#[error("'{0}' is not a #rrggbb color")]
pub struct ParseHexColorError(String);

impl FromStr for HexColor {
    type Err = ParseHexColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseHexColorError(s.to_string());

        let digits = s.strip_prefix('#').ok_or_else(err)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| err());
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl HexColor {
    /// Channels as floats in `[0, 1]`, for blending
    pub fn to_unit_rgb(self) -> [f32; 3] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

/// Everything the render loop reads when drawing a frame
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub text_color: HexColor,
    pub background_color: HexColor,
    /// Alpha of the background repaint, in `[0, 1]`
    pub trail_opacity: f64,
    /// Upper bound on drawn frames per second; always positive
    pub frames_per_second: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            text_color: DEFAULT_TEXT_COLOR,
            background_color: DEFAULT_BACKGROUND_COLOR,
            trail_opacity: DEFAULT_TRAIL_OPACITY,
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
        }
    }
}

impl RenderConfig {
    /// Minimum time between two drawn frames, in milliseconds
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.frames_per_second
    }
}

/// A single edit coming from the settings panel
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigChange {
    TextColor(HexColor),
    BackgroundColor(HexColor),
    /// Trail opacity as a whole percentage, 0 to 100
    OpacityPercent(u32),
    /// Frames per second
    Speed(u32),
}

/// The values shown by the settings panel's input controls
#[derive(Clone, Debug, PartialEq)]
pub struct ControlValues {
    pub text_color: [u8; 3],
    pub background_color: [u8; 3],
    pub opacity_percent: u32,
    pub speed: u32,
}

impl From<&RenderConfig> for ControlValues {
    fn from(config: &RenderConfig) -> Self {
        Self {
            text_color: config.text_color.0,
            background_color: config.background_color.0,
            opacity_percent: (config.trail_opacity * 100.0).round() as u32,
            speed: config.frames_per_second.round().max(1.0) as u32,
        }
    }
}
