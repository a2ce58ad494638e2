use crate::math::{clamp01, Vec2, Vec3};
use crate::scene::{Connection, DensitySource, Entity};

/// Height scale applied to the sampled background density.
const BASE_AMPLITUDE: f32 = 1.2;
/// Spatial sigma of the Gaussian bump raised around each entity.
const ENTITY_SIGMA: f32 = 1.6;
/// Perpendicular sigma of a connection ridge.
const RIDGE_SIGMA: f32 = 0.7;
/// Peak ridge height at full progress.
const RIDGE_AMPLITUDE: f32 = 0.9;
/// Exponential smoothing rate: the live buffer covers ~63% of the distance
/// to the target in 1/rate seconds.
const SMOOTHING_RATE: f32 = 8.0;

/// The cognitive waveform: a grid of height samples rebuilt from scene state
/// each frame and temporally smoothed so changes are never instantaneous.
///
/// Both buffers are flat row-major arrays owned exclusively by this struct
/// and mutated in place; nothing is reallocated per frame.
#[derive(Debug, Clone)]
pub struct Heightfield {
    grid_width: usize,
    grid_depth: usize,
    world_width: f32,
    world_depth: f32,
    heights: Vec<f32>,
    target: Vec<f32>,
}

impl Heightfield {
    /// Grid resolution is fixed for the life of the scene. Panics on a grid
    /// smaller than 2x2 or a non-positive world extent.
    pub fn new(grid_width: usize, grid_depth: usize, world_width: f32, world_depth: f32) -> Self {
        assert!(
            grid_width >= 2 && grid_depth >= 2,
            "heightfield grid must be at least 2x2"
        );
        assert!(
            world_width > 0.0 && world_depth > 0.0,
            "heightfield world extent must be positive"
        );
        let len = grid_width * grid_depth;
        Self {
            grid_width,
            grid_depth,
            world_width,
            world_depth,
            heights: vec![0.0; len],
            target: vec![0.0; len],
        }
    }

    pub fn grid_width(&self) -> usize {
        self.grid_width
    }

    pub fn grid_depth(&self) -> usize {
        self.grid_depth
    }

    pub fn world_width(&self) -> f32 {
        self.world_width
    }

    pub fn world_depth(&self) -> f32 {
        self.world_depth
    }

    /// World-space spacing between adjacent grid cells.
    pub fn cell_spacing(&self) -> (f32, f32) {
        (
            self.world_width / (self.grid_width - 1) as f32,
            self.world_depth / (self.grid_depth - 1) as f32,
        )
    }

    /// Center of the terrain at ground level; the natural orbit target.
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.world_width * 0.5, 0.0, self.world_depth * 0.5)
    }

    /// Recomputes the target buffer from scene state, then blends the live
    /// heights toward it by `1 - e^(-rate * dt)`.
    pub fn update(
        &mut self,
        density: &dyn DensitySource,
        entities: &[Entity],
        connections: &[Connection],
        dt: f32,
    ) {
        let (sx, sz) = self.cell_spacing();
        let inv_u = 1.0 / (self.grid_width - 1) as f32;
        let inv_v = 1.0 / (self.grid_depth - 1) as f32;

        // Base terrain from the density source.
        for iz in 0..self.grid_depth {
            let v = iz as f32 * inv_v;
            let row = iz * self.grid_width;
            for ix in 0..self.grid_width {
                let u = ix as f32 * inv_u;
                self.target[row + ix] = clamp01(density.density(u, v)) * BASE_AMPLITUDE;
            }
        }

        // Gaussian peak per entity, scaled by its activity level.
        let bump_cutoff_sq = (3.5 * ENTITY_SIGMA) * (3.5 * ENTITY_SIGMA);
        let inv_two_sigma_sq = 1.0 / (2.0 * ENTITY_SIGMA * ENTITY_SIGMA);
        for entity in entities {
            let amplitude = entity.activity.amplitude();
            for iz in 0..self.grid_depth {
                let wz = iz as f32 * sz;
                let dz = wz - entity.position.y;
                let row = iz * self.grid_width;
                for ix in 0..self.grid_width {
                    let wx = ix as f32 * sx;
                    let dx = wx - entity.position.x;
                    let dist_sq = dx * dx + dz * dz;
                    if dist_sq > bump_cutoff_sq {
                        continue;
                    }
                    self.target[row + ix] += amplitude * (-dist_sq * inv_two_sigma_sq).exp();
                }
            }
        }

        // Gaussian ridge along each active connection, sine-tapered so the
        // ridge is exactly zero at both endpoints.
        let inv_two_ridge_sq = 1.0 / (2.0 * RIDGE_SIGMA * RIDGE_SIGMA);
        for connection in connections {
            if !connection.active {
                continue;
            }
            let seg = connection.to - connection.from;
            let len_sq = seg.length_squared();
            if len_sq < 1e-8 {
                continue;
            }
            let amplitude = RIDGE_AMPLITUDE * clamp01(connection.progress);
            for iz in 0..self.grid_depth {
                let wz = iz as f32 * sz;
                let row = iz * self.grid_width;
                for ix in 0..self.grid_width {
                    let wx = ix as f32 * sx;
                    let rel = Vec2::new(wx, wz) - connection.from;
                    let t = rel.dot(seg) / len_sq;
                    if t <= 0.0 || t >= 1.0 {
                        continue;
                    }
                    let closest = connection.from + seg * t;
                    let perp_sq = (Vec2::new(wx, wz) - closest).length_squared();
                    let taper = (std::f32::consts::PI * t).sin();
                    self.target[row + ix] +=
                        amplitude * taper * (-perp_sq * inv_two_ridge_sq).exp();
                }
            }
        }

        // Exponential blend toward the new target.
        let alpha = clamp01(1.0 - (-SMOOTHING_RATE * dt.max(0.0)).exp());
        for (height, target) in self.heights.iter_mut().zip(self.target.iter()) {
            *height += (target - *height) * alpha;
        }
    }

    /// Height at a grid cell; anything out of range reads as 0.
    pub fn height_at(&self, ix: isize, iz: isize) -> f32 {
        if ix < 0 || iz < 0 || ix as usize >= self.grid_width || iz as usize >= self.grid_depth {
            return 0.0;
        }
        self.heights[iz as usize * self.grid_width + ix as usize]
    }

    /// Surface normal via central differences of the four grid neighbors,
    /// spaced in world units. Height runs along +Y.
    pub fn normal_at(&self, ix: usize, iz: usize) -> Vec3 {
        let (sx, sz) = self.cell_spacing();
        let ix = ix as isize;
        let iz = iz as isize;
        let dh_dx = (self.height_at(ix + 1, iz) - self.height_at(ix - 1, iz)) / (2.0 * sx);
        let dh_dz = (self.height_at(ix, iz + 1) - self.height_at(ix, iz - 1)) / (2.0 * sz);
        Vec3::new(-dh_dx, 1.0, -dh_dz).normalize()
    }

    /// World-space position of a grid cell, including its current height.
    pub fn world_pos(&self, ix: usize, iz: usize) -> Vec3 {
        let (sx, sz) = self.cell_spacing();
        Vec3::new(
            ix as f32 * sx,
            self.height_at(ix as isize, iz as isize),
            iz as f32 * sz,
        )
    }

    /// Grid cell nearest a world XZ position.
    pub fn nearest_cell(&self, position: Vec2) -> (usize, usize) {
        let (sx, sz) = self.cell_spacing();
        let ix = (position.x / sx).round().clamp(0.0, (self.grid_width - 1) as f32);
        let iz = (position.y / sz).round().clamp(0.0, (self.grid_depth - 1) as f32);
        (ix as usize, iz as usize)
    }

    pub fn target_at(&self, ix: isize, iz: isize) -> f32 {
        if ix < 0 || iz < 0 || ix as usize >= self.grid_width || iz as usize >= self.grid_depth {
            return 0.0;
        }
        self.target[iz as usize * self.grid_width + ix as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ActivityLevel, UniformDensity};

    fn field_20x15(grid: usize) -> Heightfield {
        Heightfield::new(grid, grid, 20.0, 15.0)
    }

    fn settle(field: &mut Heightfield, entities: &[Entity], connections: &[Connection]) {
        for _ in 0..60 {
            field.update(&UniformDensity(0.0), entities, connections, 0.1);
        }
    }

    #[test]
    #[should_panic(expected = "at least 2x2")]
    fn degenerate_grid_is_rejected() {
        Heightfield::new(1, 8, 10.0, 10.0);
    }

    #[test]
    #[should_panic(expected = "positive")]
    fn zero_world_extent_is_rejected() {
        Heightfield::new(8, 8, 0.0, 10.0);
    }

    #[test]
    fn out_of_range_height_reads_zero() {
        let field = field_20x15(16);
        assert_eq!(field.height_at(-1, 0), 0.0);
        assert_eq!(field.height_at(0, -1), 0.0);
        assert_eq!(field.height_at(16, 0), 0.0);
        assert_eq!(field.height_at(0, 16), 0.0);
    }

    #[test]
    fn heights_converge_to_a_fixed_target() {
        let mut field = field_20x15(24);
        let entities = [Entity::new(
            "core",
            Vec2::new(10.0, 7.5),
            ActivityLevel::Active,
        )];
        for _ in 0..60 {
            field.update(&UniformDensity(0.3), &entities, &[], 0.05);
        }
        for iz in 0..24 {
            for ix in 0..24 {
                let live = field.height_at(ix as isize, iz as isize);
                let target = field.target_at(ix as isize, iz as isize);
                assert!(
                    (live - target).abs() < 1e-3,
                    "cell ({}, {}) did not converge: {} vs {}",
                    ix,
                    iz,
                    live,
                    target
                );
            }
        }
    }

    #[test]
    fn changes_are_absorbed_gradually() {
        let mut field = field_20x15(16);
        let entities = [Entity::new(
            "burst",
            Vec2::new(10.0, 7.5),
            ActivityLevel::Spawning,
        )];
        field.update(&UniformDensity(0.0), &entities, &[], 0.016);
        let (ix, iz) = field.nearest_cell(Vec2::new(10.0, 7.5));
        let after_one = field.height_at(ix as isize, iz as isize);
        let target = field.target_at(ix as isize, iz as isize);
        // One 16ms step covers only a fraction of the jump.
        assert!(after_one > 0.0);
        assert!(after_one < target * 0.5);
    }

    #[test]
    fn processing_peak_is_taller_than_idle() {
        let position = Vec2::new(10.0, 7.5);
        let mut idle_field = field_20x15(32);
        let mut busy_field = field_20x15(32);
        settle(
            &mut idle_field,
            &[Entity::new("a", position, ActivityLevel::Idle)],
            &[],
        );
        settle(
            &mut busy_field,
            &[Entity::new("a", position, ActivityLevel::Processing)],
            &[],
        );
        let (ix, iz) = idle_field.nearest_cell(position);
        assert!(
            busy_field.height_at(ix as isize, iz as isize)
                > idle_field.height_at(ix as isize, iz as isize)
        );
    }

    #[test]
    fn entity_peak_scenario_heights_and_normals() {
        // Entity at (10, 7.5), processing, flat density: tall near the
        // entity, flat at the far edge; normal tilted on the flank, vertical
        // out in the flats.
        let mut field = field_20x15(32);
        let position = Vec2::new(10.0, 7.5);
        settle(
            &mut field,
            &[Entity::new("core", position, ActivityLevel::Processing)],
            &[],
        );

        let (ix, iz) = field.nearest_cell(position);
        let peak = field.height_at(ix as isize, iz as isize);
        let edge = field.height_at(0, 0);
        assert!(peak > edge + 1.0, "peak {} vs edge {}", peak, edge);

        // A cell on the flank (a couple of cells off the peak) is steep.
        let flank = field.normal_at(ix + 3, iz);
        assert!(flank.y < 0.9, "flank normal was {:?}", flank);

        // The far corner is genuinely flat.
        let flat = field.normal_at(2, 2);
        assert!(flat.y > 0.9, "flat normal was {:?}", flat);
    }

    #[test]
    fn connection_ridge_tapers_to_zero_at_endpoints() {
        let mut field = field_20x15(48);
        let from = Vec2::new(4.0, 7.5);
        let to = Vec2::new(16.0, 7.5);
        let connection = Connection::new(from, to);
        settle(&mut field, &[], &[connection]);

        let (mid_x, mid_z) = field.nearest_cell(Vec2::new(10.0, 7.5));
        let mid = field.height_at(mid_x as isize, mid_z as isize);
        assert!(mid > 0.2, "midpoint ridge missing: {}", mid);

        let (from_x, from_z) = field.nearest_cell(from);
        let (to_x, to_z) = field.nearest_cell(to);
        let at_from = field.height_at(from_x as isize, from_z as isize);
        let at_to = field.height_at(to_x as isize, to_z as isize);
        assert!(at_from < mid * 0.25, "ridge not tapered at start: {}", at_from);
        assert!(at_to < mid * 0.25, "ridge not tapered at end: {}", at_to);
    }

    #[test]
    fn inactive_connections_raise_nothing() {
        let mut field = field_20x15(24);
        let mut connection = Connection::new(Vec2::new(4.0, 7.5), Vec2::new(16.0, 7.5));
        connection.active = false;
        settle(&mut field, &[], &[connection]);
        assert!(field
            .heights
            .iter()
            .all(|&h| h.abs() < 1e-4));
    }

    #[test]
    fn ridge_height_scales_with_progress() {
        let from = Vec2::new(4.0, 7.5);
        let to = Vec2::new(16.0, 7.5);
        let mut half = Connection::new(from, to);
        half.progress = 0.5;
        let full = Connection::new(from, to);

        let mut half_field = field_20x15(48);
        let mut full_field = field_20x15(48);
        settle(&mut half_field, &[], &[half]);
        settle(&mut full_field, &[], &[full]);

        let (mx, mz) = half_field.nearest_cell(Vec2::new(10.0, 7.5));
        let half_h = half_field.height_at(mx as isize, mz as isize);
        let full_h = full_field.height_at(mx as isize, mz as isize);
        assert!(full_h > half_h * 1.5);
    }

    #[test]
    fn zero_length_connections_are_skipped() {
        let mut field = field_20x15(16);
        let point = Vec2::new(10.0, 7.5);
        let connection = Connection::new(point, point);
        // Must not divide by zero or raise anything anywhere.
        settle(&mut field, &[], &[connection]);
        assert!(field.heights.iter().all(|&h| h.abs() < 1e-4));
    }

    #[test]
    fn density_contributes_nonnegative_base() {
        let mut field = field_20x15(16);
        field.update(&UniformDensity(1.0), &[], &[], 10.0);
        for iz in 0..16 {
            for ix in 0..16 {
                let h = field.height_at(ix as isize, iz as isize);
                assert!(h >= 0.0);
                assert!((h - BASE_AMPLITUDE).abs() < 1e-2);
            }
        }
    }

    #[test]
    fn world_pos_spans_the_world_extent() {
        let field = field_20x15(16);
        let origin = field.world_pos(0, 0);
        let far = field.world_pos(15, 15);
        assert_eq!(origin.x, 0.0);
        assert_eq!(origin.z, 0.0);
        assert!((far.x - 20.0).abs() < 1e-5);
        assert!((far.z - 15.0).abs() < 1e-5);
    }
}
