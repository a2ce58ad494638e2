use rayon::prelude::*;

use crate::camera::{Camera, ScreenProjector};
use crate::cell::{AsciiCell, CellBuffer};
use crate::dither::BayerDither;
use crate::effects::EmitterManager;
use crate::heightfield::Heightfield;
use crate::lighting::SurfaceLighting;
use crate::math::{clamp01, Vec2, Vec3};
use crate::palette::{dithered_index, AsciiLuminancePalette, CognitiveColorRamp};
use crate::scene::Entity;

/// Palette/ramp pair for one cognitive phase, used by the proximity-weighted
/// blend mode.
#[derive(Debug, Clone)]
pub struct PhaseStyle {
    pub phase: String,
    pub palette: AsciiLuminancePalette,
    pub ramp: CognitiveColorRamp,
}

/// Alternate rasterization mode: each surface point takes the palette/ramp of
/// whichever phase dominates among nearby entities.
#[derive(Debug, Clone, Copy)]
pub struct PhaseBlend<'a> {
    pub styles: &'a [PhaseStyle],
    pub influence_radius: f32,
}

/// Everything one frame needs. The rasterizer borrows it all immutably; the
/// only mutation happens inside its own buffers.
pub struct FrameInput<'a> {
    pub field: &'a Heightfield,
    pub camera: &'a Camera,
    pub lighting: &'a SurfaceLighting,
    pub palette: &'a AsciiLuminancePalette,
    pub ramp: &'a CognitiveColorRamp,
    pub emitters: &'a EmitterManager,
    pub entities: &'a [Entity],
    pub blend: Option<PhaseBlend<'a>>,
}

#[derive(Debug, Clone, Copy)]
struct GridPoint {
    ix: u32,
    iz: u32,
    dist_sq: f32,
}

/// Luminance above which a cell is emphasized as a specular highlight.
const BOLD_LUMINANCE: f32 = 0.95;
/// Effect intensity above which an influenced cell is emphasized.
const BOLD_INTENSITY: f32 = 0.7;

/// Depth-sorted painter's-algorithm rasterizer. Owns its depth and cell
/// buffers and a scratch point list; all three are reused across frames and
/// cleared in place.
#[derive(Debug)]
pub struct Rasterizer {
    projector: ScreenProjector,
    depth: Vec<f32>,
    cells: CellBuffer,
    points: Vec<GridPoint>,
    dither: BayerDither,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            projector: ScreenProjector::new(width, height),
            depth: vec![f32::INFINITY; width * height],
            cells: CellBuffer::new(width, height),
            points: Vec::new(),
            dither: BayerDither,
        }
    }

    pub fn width(&self) -> usize {
        self.projector.width
    }

    pub fn height(&self) -> usize {
        self.projector.height
    }

    pub fn projector(&self) -> &ScreenProjector {
        &self.projector
    }

    pub fn cells(&self) -> &CellBuffer {
        &self.cells
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.projector.width == width && self.projector.height == height {
            return;
        }
        self.projector.width = width;
        self.projector.height = height;
        self.depth.clear();
        self.depth.resize(width * height, f32::INFINITY);
        self.cells.resize(width, height);
    }

    /// Renders one frame into the cell buffer and returns it.
    pub fn render(&mut self, frame: &FrameInput) -> &CellBuffer {
        self.depth.fill(f32::INFINITY);
        self.cells.clear();

        let field = frame.field;
        let camera = frame.camera;
        let view_projection = camera.view_projection(self.projector.aspect());

        // Back-to-front: farthest grid points first, so nearer geometry
        // naturally overwrites them (and the depth test settles exact ties).
        self.points.clear();
        for iz in 0..field.grid_depth() {
            for ix in 0..field.grid_width() {
                let world = field.world_pos(ix, iz);
                self.points.push(GridPoint {
                    ix: ix as u32,
                    iz: iz as u32,
                    dist_sq: (world - camera.position).length_squared(),
                });
            }
        }
        self.points.par_sort_unstable_by(|a, b| {
            b.dist_sq
                .partial_cmp(&a.dist_sq)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Pre-resolve each entity's phase to a style index once per frame.
        let entity_styles: Vec<Option<usize>> = match &frame.blend {
            Some(blend) => frame
                .entities
                .iter()
                .map(|entity| {
                    blend
                        .styles
                        .iter()
                        .position(|style| style.phase == entity.phase)
                })
                .collect(),
            None => Vec::new(),
        };
        let mut phase_weights: Vec<f32> = frame
            .blend
            .as_ref()
            .map(|blend| vec![0.0; blend.styles.len()])
            .unwrap_or_default();

        for point_index in 0..self.points.len() {
            let point = self.points[point_index];
            let ix = point.ix as usize;
            let iz = point.iz as usize;
            let base = field.world_pos(ix, iz);

            // Emitter height delta moves the point before projection.
            let influence = frame.emitters.influence_at(base);
            let world = Vec3::new(base.x, base.y + influence.height, base.z);

            let projection = self.projector.project_with(&view_projection, world);
            if !projection.visible {
                continue;
            }
            let col = projection.x as usize;
            let row = projection.y as usize;
            let index = row * self.projector.width + col;
            if projection.depth >= self.depth[index] {
                continue;
            }

            let normal = field.normal_at(ix, iz);
            let view_dir = (camera.position - world).normalize();
            let mut luminance = frame.lighting.luminance(normal, view_dir);

            // Pick the palette/ramp: phase blend first, plain defaults else.
            let (palette, ramp) = match &frame.blend {
                Some(blend) => {
                    match dominant_style(
                        blend,
                        frame.entities,
                        &entity_styles,
                        &mut phase_weights,
                        Vec2::new(world.x, world.z),
                    ) {
                        Some(style_index) => {
                            let style = &blend.styles[style_index];
                            (&style.palette, &style.ramp)
                        }
                        None => (frame.palette, frame.ramp),
                    }
                }
                None => (frame.palette, frame.ramp),
            };

            let cell = if influence.intensity > 0.0 {
                luminance = clamp01(luminance + influence.luminance);
                let ch = if let Some(ch) = influence.char_override {
                    ch
                } else if let Some(chars) = influence.palette_override {
                    chars[dithered_index(luminance, chars.len(), col, row, &self.dither)]
                } else {
                    palette.char_for_surface(luminance, normal, col, row, &self.dither)
                };
                let fg = influence
                    .color_override
                    .unwrap_or_else(|| ramp.color_dithered(luminance, col, row, &self.dither));
                AsciiCell {
                    ch,
                    fg,
                    bg: None,
                    bold: influence.intensity > BOLD_INTENSITY,
                }
            } else {
                AsciiCell {
                    ch: palette.char_for_surface(luminance, normal, col, row, &self.dither),
                    fg: ramp.color_dithered(luminance, col, row, &self.dither),
                    bg: None,
                    bold: luminance > BOLD_LUMINANCE,
                }
            };

            self.cells.set(row, col, cell);
            self.depth[index] = projection.depth;
        }

        &self.cells
    }
}

/// Proximity-weighted phase vote at one surface point. Each entity within
/// the influence radius adds `(1 - d/r)^2` to its phase; the heaviest phase
/// wins, or None when nothing is in range.
fn dominant_style(
    blend: &PhaseBlend,
    entities: &[Entity],
    entity_styles: &[Option<usize>],
    phase_weights: &mut [f32],
    point: Vec2,
) -> Option<usize> {
    phase_weights.fill(0.0);
    let radius = blend.influence_radius.max(1e-6);
    for (entity, style) in entities.iter().zip(entity_styles.iter()) {
        let Some(style_index) = style else {
            continue;
        };
        let dist = (entity.position - point).length();
        if dist >= radius {
            continue;
        }
        let w = 1.0 - dist / radius;
        phase_weights[*style_index] += w * w;
    }

    let mut best = None;
    let mut best_weight = 0.0;
    for (style_index, &weight) in phase_weights.iter().enumerate() {
        if weight > best_weight {
            best_weight = weight;
            best = Some(style_index);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectMetadata, EmitterEffect};
    use crate::scene::{ActivityLevel, UniformDensity};

    fn settled_field(entities: &[Entity]) -> Heightfield {
        let mut field = Heightfield::new(32, 32, 20.0, 15.0);
        for _ in 0..60 {
            field.update(&UniformDensity(0.2), entities, &[], 0.1);
        }
        field
    }

    fn default_ramp() -> CognitiveColorRamp {
        CognitiveColorRamp::new("base", vec![17, 61, 104, 147, 190, 233])
    }

    fn frame_input<'a>(
        field: &'a Heightfield,
        camera: &'a Camera,
        lighting: &'a SurfaceLighting,
        palette: &'a AsciiLuminancePalette,
        ramp: &'a CognitiveColorRamp,
        emitters: &'a EmitterManager,
        entities: &'a [Entity],
    ) -> FrameInput<'a> {
        FrameInput {
            field,
            camera,
            lighting,
            palette,
            ramp,
            emitters,
            entities,
            blend: None,
        }
    }

    fn overhead_camera(field: &Heightfield) -> Camera {
        let center = field.center();
        Camera::new(center + Vec3::new(0.0, 18.0, 14.0), center)
    }

    #[test]
    fn rendering_fills_cells_and_is_deterministic() {
        let field = settled_field(&[Entity::new(
            "core",
            Vec2::new(10.0, 7.5),
            ActivityLevel::Processing,
        )]);
        let camera = overhead_camera(&field);
        let lighting = SurfaceLighting::default();
        let palette = AsciiLuminancePalette::default();
        let ramp = default_ramp();
        let emitters = EmitterManager::new();

        let mut rasterizer = Rasterizer::new(80, 40);
        let first: Vec<_> = rasterizer
            .render(&frame_input(
                &field, &camera, &lighting, &palette, &ramp, &emitters, &[],
            ))
            .cells()
            .to_vec();
        let non_empty = first.iter().filter(|c| !c.is_empty()).count();
        assert!(non_empty > 200, "only {} cells written", non_empty);

        let second: Vec<_> = rasterizer
            .render(&frame_input(
                &field, &camera, &lighting, &palette, &ramp, &emitters, &[],
            ))
            .cells()
            .to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn depth_test_keeps_the_nearest_point_per_cell() {
        // Recompute every point's projection through the public API and
        // check each written cell holds the minimum depth that landed there,
        // regardless of the order points were submitted in.
        let field = settled_field(&[Entity::new(
            "core",
            Vec2::new(10.0, 7.5),
            ActivityLevel::Spawning,
        )]);
        let camera = overhead_camera(&field);
        let lighting = SurfaceLighting::default();
        let palette = AsciiLuminancePalette::default();
        let ramp = default_ramp();
        let emitters = EmitterManager::new();

        let mut rasterizer = Rasterizer::new(48, 24);
        rasterizer.render(&frame_input(
            &field, &camera, &lighting, &palette, &ramp, &emitters, &[],
        ));

        let projector = *rasterizer.projector();
        let vp = camera.view_projection(projector.aspect());
        let mut min_depth = vec![f32::INFINITY; 48 * 24];
        for iz in 0..field.grid_depth() {
            for ix in 0..field.grid_width() {
                let proj = projector.project_with(&vp, field.world_pos(ix, iz));
                if !proj.visible {
                    continue;
                }
                let idx = proj.y as usize * 48 + proj.x as usize;
                if proj.depth < min_depth[idx] {
                    min_depth[idx] = proj.depth;
                }
            }
        }
        for (idx, &expected) in min_depth.iter().enumerate() {
            assert!(
                (rasterizer.depth[idx] - expected).abs() < 1e-6
                    || (rasterizer.depth[idx].is_infinite() && expected.is_infinite()),
                "cell {} holds depth {} but nearest was {}",
                idx,
                rasterizer.depth[idx],
                expected
            );
        }
    }

    #[test]
    fn buffers_reset_between_frames() {
        let busy = settled_field(&[Entity::new(
            "core",
            Vec2::new(10.0, 7.5),
            ActivityLevel::Spawning,
        )]);
        let camera = overhead_camera(&busy);
        let lighting = SurfaceLighting::default();
        let palette = AsciiLuminancePalette::default();
        let ramp = default_ramp();
        let emitters = EmitterManager::new();

        let mut rasterizer = Rasterizer::new(60, 30);
        rasterizer.render(&frame_input(
            &busy, &camera, &lighting, &palette, &ramp, &emitters, &[],
        ));

        // A camera pointed away must leave a fully empty buffer; stale cells
        // from the previous frame may not leak through.
        let away = Camera::new(
            camera.position,
            camera.position + (camera.position - camera.target),
        );
        let cells = rasterizer.render(&frame_input(
            &busy, &away, &lighting, &palette, &ramp, &emitters, &[],
        ));
        assert!(cells.cells().iter().all(|c| c.is_empty()));
    }

    #[test]
    fn emitter_overrides_reach_the_cells() {
        let field = settled_field(&[]);
        let camera = overhead_camera(&field);
        let lighting = SurfaceLighting::default();
        let palette = AsciiLuminancePalette::new("ABCDE");
        let ramp = default_ramp();

        let mut emitters = EmitterManager::new();
        emitters.emit(
            EmitterEffect::Confetti {
                duration: 2.0,
                radius: 12.0,
                spread: 1.0,
            },
            field.center(),
            0.0,
            EffectMetadata::new(),
        );
        emitters.update(0.2);

        let mut rasterizer = Rasterizer::new(80, 40);
        let cells = rasterizer.render(&frame_input(
            &field, &camera, &lighting, &palette, &ramp, &emitters, &[],
        ));

        let confetti_cells = cells
            .cells()
            .iter()
            .filter(|c| crate::effects::CONFETTI_CHARS.contains(&c.ch))
            .count();
        assert!(confetti_cells > 0, "no confetti characters were written");
    }

    #[test]
    fn phase_blend_selects_the_nearest_entity_style() {
        let entities = [
            Entity::new("left", Vec2::new(5.0, 7.5), ActivityLevel::Active).with_phase("focus"),
            Entity::new("right", Vec2::new(15.0, 7.5), ActivityLevel::Active).with_phase("dream"),
        ];
        let field = settled_field(&entities);
        let camera = overhead_camera(&field);
        let lighting = SurfaceLighting::default();
        let palette = AsciiLuminancePalette::new("!?");
        let ramp = default_ramp();
        let emitters = EmitterManager::new();

        // Disjoint charsets so the winning style is visible in the output.
        let styles = [
            PhaseStyle {
                phase: "focus".into(),
                palette: AsciiLuminancePalette::new("fffff"),
                ramp: CognitiveColorRamp::new("focus", vec![21, 27, 33, 39, 45]),
            },
            PhaseStyle {
                phase: "dream".into(),
                palette: AsciiLuminancePalette::new("ddddd"),
                ramp: CognitiveColorRamp::new("dream", vec![90, 91, 92, 93, 94]),
            },
        ];

        let mut rasterizer = Rasterizer::new(100, 50);
        let cells = rasterizer.render(&FrameInput {
            field: &field,
            camera: &camera,
            lighting: &lighting,
            palette: &palette,
            ramp: &ramp,
            emitters: &emitters,
            entities: &entities,
            blend: Some(PhaseBlend {
                styles: &styles,
                influence_radius: 4.0,
            }),
        });

        let count = |ch: char| cells.cells().iter().filter(|c| c.ch == ch).count();
        assert!(count('f') > 0, "focus style never selected");
        assert!(count('d') > 0, "dream style never selected");
        // Points outside both influence radii fall back to the defaults.
        assert!(count('!') + count('?') > 0, "default style never selected");
    }

    #[test]
    fn dominant_style_prefers_heavier_weight_and_handles_empty_range() {
        let entities = [
            Entity::new("a", Vec2::new(0.0, 0.0), ActivityLevel::Active).with_phase("focus"),
            Entity::new("b", Vec2::new(3.0, 0.0), ActivityLevel::Active).with_phase("dream"),
        ];
        let styles = [
            PhaseStyle {
                phase: "focus".into(),
                palette: AsciiLuminancePalette::new("x"),
                ramp: CognitiveColorRamp::new("focus", vec![1, 2]),
            },
            PhaseStyle {
                phase: "dream".into(),
                palette: AsciiLuminancePalette::new("y"),
                ramp: CognitiveColorRamp::new("dream", vec![3, 4]),
            },
        ];
        let blend = PhaseBlend {
            styles: &styles,
            influence_radius: 4.0,
        };
        let entity_styles = [Some(0), Some(1)];
        let mut weights = vec![0.0; 2];

        let near_a = dominant_style(
            &blend,
            &entities,
            &entity_styles,
            &mut weights,
            Vec2::new(0.5, 0.0),
        );
        assert_eq!(near_a, Some(0));
        let near_b = dominant_style(
            &blend,
            &entities,
            &entity_styles,
            &mut weights,
            Vec2::new(2.8, 0.0),
        );
        assert_eq!(near_b, Some(1));
        let nowhere = dominant_style(
            &blend,
            &entities,
            &entity_styles,
            &mut weights,
            Vec2::new(50.0, 50.0),
        );
        assert_eq!(nowhere, None);
    }

    #[test]
    fn resize_rebuilds_buffers() {
        let mut rasterizer = Rasterizer::new(40, 20);
        rasterizer.resize(64, 32);
        assert_eq!(rasterizer.width(), 64);
        assert_eq!(rasterizer.height(), 32);
        assert_eq!(rasterizer.cells().cells().len(), 64 * 32);
        assert_eq!(rasterizer.depth.len(), 64 * 32);
    }
}
