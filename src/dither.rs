/// Ordered dithering via the classic 4x4 Bayer index matrix. The 16 entries
/// produce 16 distinct, evenly spaced thresholds in [0, 1), tiling with
/// period 4 on both axes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BayerDither;

const BAYER_4X4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

impl BayerDither {
    pub fn threshold(&self, x: usize, y: usize) -> f32 {
        BAYER_4X4[y % 4][x % 4] as f32 / 16.0
    }
}
