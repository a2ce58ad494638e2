use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::effects::{EffectMetadata, EmitterEffect, EmitterManager, META_HEAT, META_INTENSITY};
use crate::math::{clamp01, Vec2, Vec3};
use crate::palette::{AsciiLuminancePalette, CognitiveColorRamp};
use crate::rasterizer::PhaseStyle;
use crate::scene::{ActivityLevel, Connection, DensitySource, Entity};

// --- Demo scene ---

pub const WORLD_WIDTH: f32 = 20.0;
pub const WORLD_DEPTH: f32 = 15.0;

const PHASES: &[&str] = &["focus", "flow", "recall", "dream"];

/// Slowly drifting pseudo-noise density: a sum of seeded sinusoids over the
/// unit square. Deterministic in (seed, time); no ambient clock involved.
#[derive(Debug, Clone)]
pub struct DriftField {
    offsets: [f32; 3],
    time: f32,
}

impl DriftField {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            offsets: [
                rng.random_range(0.0..TAU),
                rng.random_range(0.0..TAU),
                rng.random_range(0.0..TAU),
            ],
            time: 0.0,
        }
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }
}

impl DensitySource for DriftField {
    fn density(&self, u: f32, v: f32) -> f32 {
        let t = self.time;
        let [p0, p1, p2] = self.offsets;
        let wave = 0.20 * (u * TAU * 1.7 + t * 0.35 + p0).sin()
            + 0.18 * (v * TAU * 2.3 - t * 0.27 + p1).sin()
            + 0.12 * ((u + v) * TAU * 1.1 + t * 0.50 + p2).sin();
        clamp01(0.45 + wave)
    }
}

#[derive(Debug, Clone, Copy)]
struct Orbit {
    home: Vec2,
    radius: f32,
    speed: f32,
    phase: f32,
}

/// Procedurally driven scene for the demo binary: a handful of entities on
/// slow orbits, cycling activity, pulsing connections, and periodic effect
/// emission. Fully determined by its seed.
pub struct DemoScene {
    pub density: DriftField,
    pub entities: Vec<Entity>,
    pub connections: Vec<Connection>,
    orbits: Vec<Orbit>,
    rng: StdRng,
    time: f32,
    next_effect_at: f32,
    next_activity_at: f32,
    emit_effects: bool,
}

impl DemoScene {
    pub fn new(seed: u64, emit_effects: bool) -> Self {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_mul(0x9E37_79B9).wrapping_add(seed));
        let names = ["planner", "scout", "archivist", "dreamer", "core"];
        let homes = [
            Vec2::new(5.0, 4.0),
            Vec2::new(15.0, 4.5),
            Vec2::new(4.5, 11.0),
            Vec2::new(15.5, 11.0),
            Vec2::new(10.0, 7.5),
        ];

        let mut entities = Vec::with_capacity(names.len());
        let mut orbits = Vec::with_capacity(names.len());
        for (i, (&name, &home)) in names.iter().zip(homes.iter()).enumerate() {
            let phase = PHASES[i % PHASES.len()];
            entities.push(
                Entity::new(name, home, ActivityLevel::Active)
                    .with_phase(phase)
                    .with_group("demo"),
            );
            orbits.push(Orbit {
                home,
                radius: rng.random_range(0.6..1.6),
                speed: rng.random_range(0.15..0.45),
                phase: rng.random_range(0.0..TAU),
            });
        }

        // Everyone talks to the core, plus one cross link.
        let core = homes[4];
        let mut connections: Vec<Connection> = homes[..4]
            .iter()
            .map(|&home| Connection::new(home, core))
            .collect();
        connections.push(Connection::new(homes[0], homes[3]));

        Self {
            density: DriftField::new(seed),
            entities,
            connections,
            orbits,
            rng,
            time: 0.0,
            next_effect_at: 1.0,
            next_activity_at: 2.0,
            emit_effects,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances the scene clock: entity drift, activity cycling, connection
    /// progress, and (when enabled) effect emission.
    pub fn advance(&mut self, dt: f32, emitters: &mut EmitterManager) {
        self.time += dt;
        self.density.set_time(self.time);

        for (entity, orbit) in self.entities.iter_mut().zip(self.orbits.iter()) {
            let angle = self.time * orbit.speed + orbit.phase;
            entity.position = orbit.home
                + Vec2::new(angle.cos() * orbit.radius, angle.sin() * orbit.radius * 0.7);
        }

        if self.time >= self.next_activity_at {
            self.next_activity_at = self.time + self.rng.random_range(1.5..3.5);
            let which = self.rng.random_range(0..self.entities.len());
            self.entities[which].activity = match self.rng.random_range(0..4) {
                0 => ActivityLevel::Idle,
                1 => ActivityLevel::Active,
                2 => ActivityLevel::Processing,
                _ => ActivityLevel::Spawning,
            };
        }

        for (i, connection) in self.connections.iter_mut().enumerate() {
            let wave = (self.time * 0.6 + i as f32 * 1.3).sin();
            connection.active = wave > -0.3;
            connection.progress = clamp01(wave * 0.5 + 0.5);
            // Follow the drifting endpoints.
            if i < 4 {
                connection.from = self.entities[i].position;
                connection.to = self.entities[4].position;
            } else {
                connection.from = self.entities[0].position;
                connection.to = self.entities[3].position;
            }
        }

        if self.emit_effects && self.time >= self.next_effect_at {
            self.next_effect_at = self.time + self.rng.random_range(1.5..4.0);
            self.emit_random_effect(emitters);
        }
    }

    fn emit_random_effect(&mut self, emitters: &mut EmitterManager) {
        let which = self.rng.random_range(0..self.entities.len());
        let at = self.entities[which].position;
        let anchor = Vec3::new(at.x, 1.0, at.y);

        let mut metadata = EffectMetadata::new();
        metadata.insert(META_INTENSITY.into(), self.rng.random_range(0.7..1.2));

        let effect = match self.rng.random_range(0..5) {
            0 => {
                metadata.insert(META_HEAT.into(), self.rng.random_range(0.0..1.0));
                EmitterEffect::RadialBurst {
                    duration: 1.8,
                    radius: 9.0,
                    speed: 4.5,
                    ring_width: 1.2,
                }
            }
            1 => EmitterEffect::HeightPulse {
                duration: 2.2,
                radius: 6.0,
                amplitude: 1.8,
                peak_fraction: 0.35,
                sigma: 2.0,
            },
            2 => EmitterEffect::Turbulence {
                duration: 3.0,
                radius: 8.0,
                amplitude: 0.9,
                frequency: 1.8,
            },
            3 => EmitterEffect::ColorWash {
                duration: 2.6,
                radius: 12.0,
                speed: 6.0,
                ramp: CognitiveColorRamp::new("wash", vec![54, 55, 92, 129, 165, 201]),
            },
            _ => EmitterEffect::Confetti {
                duration: 2.0,
                radius: 7.0,
                spread: 0.55,
            },
        };

        emitters.emit(effect, anchor, self.time, metadata);
    }
}

/// One palette/ramp pair per demo phase, with visually distinct ramps.
pub fn phase_styles() -> Vec<PhaseStyle> {
    let charset = " .:-=+*#%@";
    vec![
        PhaseStyle {
            phase: "focus".into(),
            palette: AsciiLuminancePalette::new(charset),
            ramp: CognitiveColorRamp::new("focus", vec![17, 18, 19, 20, 27, 33, 39, 45]),
        },
        PhaseStyle {
            phase: "flow".into(),
            palette: AsciiLuminancePalette::new(charset),
            ramp: CognitiveColorRamp::new("flow", vec![22, 28, 34, 40, 46, 82, 118, 154]),
        },
        PhaseStyle {
            phase: "recall".into(),
            palette: AsciiLuminancePalette::new(charset),
            ramp: CognitiveColorRamp::new("recall", vec![52, 88, 124, 160, 196, 202, 208, 214]),
        },
        PhaseStyle {
            phase: "dream".into(),
            palette: AsciiLuminancePalette::new(charset),
            ramp: CognitiveColorRamp::new("dream", vec![53, 54, 90, 91, 127, 128, 164, 201]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_field_stays_in_unit_range() {
        let mut field = DriftField::new(99);
        for step in 0..40 {
            field.set_time(step as f32 * 0.25);
            for iv in 0..=10 {
                for iu in 0..=10 {
                    let d = field.density(iu as f32 / 10.0, iv as f32 / 10.0);
                    assert!((0.0..=1.0).contains(&d), "density {} out of range", d);
                }
            }
        }
    }

    #[test]
    fn same_seed_same_scene() {
        let mut a = DemoScene::new(7, true);
        let mut b = DemoScene::new(7, true);
        let mut emitters_a = EmitterManager::new();
        let mut emitters_b = EmitterManager::new();
        for _ in 0..120 {
            a.advance(0.033, &mut emitters_a);
            b.advance(0.033, &mut emitters_b);
        }
        assert_eq!(emitters_a.len(), emitters_b.len());
        for (ea, eb) in a.entities.iter().zip(b.entities.iter()) {
            assert_eq!(ea.position, eb.position);
            assert_eq!(ea.activity, eb.activity);
        }
    }

    #[test]
    fn entities_stay_near_their_homes() {
        let mut scene = DemoScene::new(3, false);
        let mut emitters = EmitterManager::new();
        for _ in 0..300 {
            scene.advance(0.05, &mut emitters);
        }
        assert!(emitters.is_empty(), "effects emitted while disabled");
        for entity in &scene.entities {
            assert!(entity.position.x > 0.0 && entity.position.x < WORLD_WIDTH);
            assert!(entity.position.y > 0.0 && entity.position.y < WORLD_DEPTH);
        }
    }

    #[test]
    fn effects_are_emitted_over_time() {
        let mut scene = DemoScene::new(11, true);
        let mut emitters = EmitterManager::new();
        for _ in 0..100 {
            scene.advance(0.1, &mut emitters);
        }
        // 10 seconds with a 1.5-4.0s cadence: at least a couple of
        // instances fired (nothing ages them here, so none were reaped).
        assert!(emitters.len() >= 2, "only {} effects fired", emitters.len());
        assert!(scene.time() >= 9.9);
    }

    #[test]
    fn phase_styles_cover_the_demo_phases() {
        let styles = phase_styles();
        for phase in PHASES {
            assert!(
                styles.iter().any(|s| s.phase == *phase),
                "missing style for {}",
                phase
            );
        }
    }
}
