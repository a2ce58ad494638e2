use crate::dither::BayerDither;
use crate::math::{clamp01, Vec3};

/// Default darkest-to-brightest character ramp.
pub const DENSITY_RAMP: &str = " .:-=+*#%@";

/// Luminance band within which surface-edge characters may substitute for
/// the dithered ramp character.
pub const EDGE_MID_BAND: (f32, f32) = (0.15, 0.85);
/// Minimum magnitude of a normal's horizontal/vertical component before a
/// directional edge character is emitted.
pub const EDGE_NORMAL_THRESHOLD: f32 = 0.5;

/// Shared selection rule for palettes and color ramps: scale luminance onto
/// the entry range, then round the fractional part up when it exceeds the
/// screen-position-keyed Bayer threshold.
pub fn dithered_index(
    luminance: f32,
    len: usize,
    screen_x: usize,
    screen_y: usize,
    dither: &BayerDither,
) -> usize {
    if len <= 1 {
        return 0;
    }
    let scaled = clamp01(luminance) * (len - 1) as f32;
    let base = scaled.floor();
    let frac = scaled - base;
    let mut index = base as usize;
    if frac > dither.threshold(screen_x, screen_y) {
        index += 1;
    }
    index.min(len - 1)
}

fn nearest_index(luminance: f32, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let index = (clamp01(luminance) * (len - 1) as f32).round() as usize;
    index.min(len - 1)
}

/// Ordered darkest-to-brightest character sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiLuminancePalette {
    chars: Vec<char>,
}

impl AsciiLuminancePalette {
    /// Panics on an empty charset: an empty palette would silently corrupt
    /// every subsequent frame, so construction is the one place that rejects
    /// it hard. Callers wanting smooth phase palettes should supply >= 5
    /// characters.
    pub fn new(charset: &str) -> Self {
        let chars: Vec<char> = charset.chars().collect();
        assert!(
            !chars.is_empty(),
            "luminance palette requires at least one character"
        );
        Self { chars }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Nearest character for a luminance value, clamped to [0, 1].
    pub fn char_for(&self, luminance: f32) -> char {
        self.chars[nearest_index(luminance, self.chars.len())]
    }

    /// Ordered-dither variant keyed on screen position.
    pub fn char_dithered(
        &self,
        luminance: f32,
        screen_x: usize,
        screen_y: usize,
        dither: &BayerDither,
    ) -> char {
        self.chars[dithered_index(luminance, self.chars.len(), screen_x, screen_y, dither)]
    }

    /// Surface-aware variant: mid-band luminance on a steep surface emits a
    /// directional edge character instead of the dithered ramp character.
    pub fn char_for_surface(
        &self,
        luminance: f32,
        normal: Vec3,
        screen_x: usize,
        screen_y: usize,
        dither: &BayerDither,
    ) -> char {
        let l = clamp01(luminance);
        if l >= EDGE_MID_BAND.0 && l <= EDGE_MID_BAND.1 {
            if normal.x.abs() > EDGE_NORMAL_THRESHOLD {
                return if normal.x > 0.0 { '/' } else { '\\' };
            }
            if normal.z.abs() > EDGE_NORMAL_THRESHOLD {
                return if normal.z > 0.0 { '-' } else { '|' };
            }
        }
        self.char_dithered(l, screen_x, screen_y, dither)
    }
}

impl Default for AsciiLuminancePalette {
    fn default() -> Self {
        Self::new(DENSITY_RAMP)
    }
}

/// Ordered dark-to-bright sequence of color codes, tagged with the cognitive
/// phase it renders. Codes are ANSI-256 values; adapters map them to their
/// platform's color representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitiveColorRamp {
    phase: String,
    colors: Vec<u8>,
}

impl CognitiveColorRamp {
    /// Panics on fewer than two stops (same fail-fast policy as the palette).
    pub fn new(phase: impl Into<String>, colors: Vec<u8>) -> Self {
        assert!(
            colors.len() >= 2,
            "color ramp requires at least two stops"
        );
        Self {
            phase: phase.into(),
            colors,
        }
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn color_for(&self, luminance: f32) -> u8 {
        self.colors[nearest_index(luminance, self.colors.len())]
    }

    pub fn color_dithered(
        &self,
        luminance: f32,
        screen_x: usize,
        screen_y: usize,
        dither: &BayerDither,
    ) -> u8 {
        self.colors[dithered_index(luminance, self.colors.len(), screen_x, screen_y, dither)]
    }
}
