/// Default foreground color code (ANSI-256 light gray).
pub const DEFAULT_FG: u8 = 7;

/// One rendered cell: a character plus styling. Color codes are ANSI-256
/// values; surface adapters map them (and the bold flag) to their platform
/// without needing to know how the cell was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiCell {
    pub ch: char,
    pub fg: u8,
    pub bg: Option<u8>,
    pub bold: bool,
}

impl AsciiCell {
    pub const EMPTY: AsciiCell = AsciiCell {
        ch: ' ',
        fg: DEFAULT_FG,
        bg: None,
        bold: false,
    };

    pub fn new(ch: char, fg: u8) -> Self {
        Self {
            ch,
            fg,
            bg: None,
            bold: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl Default for AsciiCell {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Row-major grid of cells; the sole output artifact of the pipeline.
/// Cleared in place each frame rather than reallocated.
#[derive(Debug, Clone)]
pub struct CellBuffer {
    width: usize,
    height: usize,
    cells: Vec<AsciiCell>,
}

impl CellBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![AsciiCell::EMPTY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Out-of-range lookups return the empty sentinel rather than failing.
    pub fn get(&self, row: usize, col: usize) -> AsciiCell {
        if row >= self.height || col >= self.width {
            return AsciiCell::EMPTY;
        }
        self.cells[row * self.width + col]
    }

    /// Out-of-range writes are silently dropped.
    pub fn set(&mut self, row: usize, col: usize, cell: AsciiCell) {
        if row >= self.height || col >= self.width {
            return;
        }
        self.cells[row * self.width + col] = cell;
    }

    pub fn clear(&mut self) {
        self.cells.fill(AsciiCell::EMPTY);
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells.resize(width * height, AsciiCell::EMPTY);
    }

    pub fn row(&self, row: usize) -> &[AsciiCell] {
        let start = row * self.width;
        &self.cells[start..start + self.width]
    }

    pub fn cells(&self) -> &[AsciiCell] {
        &self.cells
    }
}

/// Quantize an RGB triple onto the ANSI-256 cube (grayscale ramp for neutral
/// colors, 6x6x6 cube otherwise).
pub fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return 232 + ((r as f32 - 8.0) / 247.0 * 24.0) as u8;
    }
    let ri = (r as f32 / 255.0 * 5.0 + 0.5) as u8;
    let gi = (g as f32 / 255.0 * 5.0 + 0.5) as u8;
    let bi = (b as f32 / 255.0 * 5.0 + 0.5) as u8;
    16 + 36 * ri + 6 * gi + bi
}
