use std::collections::HashMap;

use crate::math::{clamp01, hash01, Vec3};
use crate::palette::CognitiveColorRamp;

// --- Metadata ---

/// Optional scalar modulation inputs for an effect instance. Absent keys use
/// the variant's default, so an empty map reproduces unmodulated behavior
/// exactly (there is a single evaluation path, not a legacy overload).
pub type EffectMetadata = HashMap<String, f32>;

pub const META_INTENSITY: &str = "intensity";
pub const META_HEAT: &str = "heat";
pub const META_DENSITY: &str = "density";
pub const META_DURATION_SCALE: &str = "duration_scale";
pub const META_RADIUS_SCALE: &str = "radius_scale";

fn meta_or(metadata: &EffectMetadata, key: &str, default: f32) -> f32 {
    metadata.get(key).copied().unwrap_or(default)
}

// --- Influence ---

/// Characters confetti scatters across the terrain, and the palette a hot
/// radial burst switches cells to. Both darkest to brightest.
pub const CONFETTI_CHARS: &[char] = &['*', '+', 'o', 'x', '~'];
pub const BURST_CHARS: &[char] = &['.', ':', '+', '*', '#', '@'];

const CONFETTI_COLORS: &[u8] = &[196, 208, 226, 46, 51, 201];

/// Additive contribution of one or more effects at a query point.
///
/// Combining with `+` sums height and luminance, resolves the discrete
/// overrides by strictly greater intensity (ties keep the left operand's
/// non-None value), and keeps the max intensity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectInfluence {
    pub height: f32,
    pub luminance: f32,
    pub char_override: Option<char>,
    pub color_override: Option<u8>,
    pub palette_override: Option<&'static [char]>,
    pub intensity: f32,
}

impl EffectInfluence {
    pub const ZERO: EffectInfluence = EffectInfluence {
        height: 0.0,
        luminance: 0.0,
        char_override: None,
        color_override: None,
        palette_override: None,
        intensity: 0.0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl std::ops::Add for EffectInfluence {
    type Output = EffectInfluence;

    fn add(self, rhs: EffectInfluence) -> EffectInfluence {
        let (char_override, color_override, palette_override) = if rhs.intensity > self.intensity {
            (
                rhs.char_override.or(self.char_override),
                rhs.color_override.or(self.color_override),
                rhs.palette_override.or(self.palette_override),
            )
        } else {
            (
                self.char_override.or(rhs.char_override),
                self.color_override.or(rhs.color_override),
                self.palette_override.or(rhs.palette_override),
            )
        };
        EffectInfluence {
            height: self.height + rhs.height,
            luminance: self.luminance + rhs.luminance,
            char_override,
            color_override,
            palette_override,
            intensity: self.intensity.max(rhs.intensity),
        }
    }
}

// --- Effect variants ---

/// Transient terrain effects. A closed set by design: the manager
/// pattern-matches these variants directly, and adding a sixth kind is a
/// deliberate, reviewed change.
#[derive(Debug, Clone)]
pub enum EmitterEffect {
    /// Expanding thin ring; heat metadata raises its expansion speed.
    RadialBurst {
        duration: f32,
        radius: f32,
        speed: f32,
        ring_width: f32,
    },
    /// Height rises linearly to a peak, then falls; Gaussian falloff from
    /// the anchor.
    HeightPulse {
        duration: f32,
        radius: f32,
        amplitude: f32,
        peak_fraction: f32,
        sigma: f32,
    },
    /// Sine/cosine pseudo-noise height modulation under a ramp/hold/fade
    /// envelope.
    Turbulence {
        duration: f32,
        radius: f32,
        amplitude: f32,
        frequency: f32,
    },
    /// Linear wavefront recoloring everything it has already reached.
    ColorWash {
        duration: f32,
        radius: f32,
        speed: f32,
        ramp: CognitiveColorRamp,
    },
    /// Scattered celebratory characters chosen by a deterministic hash of
    /// (distance, age).
    Confetti {
        duration: f32,
        radius: f32,
        spread: f32,
    },
}

const TURBULENCE_RAMP_UP: f32 = 0.2;
const TURBULENCE_FADE_OUT: f32 = 0.5;
const BURST_PALETTE_THRESHOLD: f32 = 0.6;
const BURST_HOT_HEAT: f32 = 0.5;
const CONFETTI_VISIBILITY: f32 = 0.25;

impl EmitterEffect {
    pub fn base_duration(&self) -> f32 {
        match self {
            EmitterEffect::RadialBurst { duration, .. }
            | EmitterEffect::HeightPulse { duration, .. }
            | EmitterEffect::Turbulence { duration, .. }
            | EmitterEffect::ColorWash { duration, .. }
            | EmitterEffect::Confetti { duration, .. } => *duration,
        }
    }

    pub fn base_radius(&self) -> f32 {
        match self {
            EmitterEffect::RadialBurst { radius, .. }
            | EmitterEffect::HeightPulse { radius, .. }
            | EmitterEffect::Turbulence { radius, .. }
            | EmitterEffect::ColorWash { radius, .. }
            | EmitterEffect::Confetti { radius, .. } => *radius,
        }
    }

    pub fn effective_duration(&self, metadata: &EffectMetadata) -> f32 {
        self.base_duration() * meta_or(metadata, META_DURATION_SCALE, 1.0).max(0.0)
    }

    pub fn effective_radius(&self, metadata: &EffectMetadata) -> f32 {
        self.base_radius() * meta_or(metadata, META_RADIUS_SCALE, 1.0).max(0.0)
    }

    /// Influence of this effect at `distance` from its anchor, `age` seconds
    /// after activation. Pure: same inputs, same output.
    ///
    /// Exactly the zero influence outside the effect's lifetime or radius —
    /// no partial fade past either boundary.
    pub fn influence(&self, distance: f32, age: f32, metadata: &EffectMetadata) -> EffectInfluence {
        let duration = self.effective_duration(metadata);
        let radius = self.effective_radius(metadata);
        if age < 0.0 || age >= duration || distance > radius {
            return EffectInfluence::ZERO;
        }
        let intensity_scale = meta_or(metadata, META_INTENSITY, 1.0);

        match self {
            EmitterEffect::RadialBurst {
                speed, ring_width, ..
            } => {
                let heat = meta_or(metadata, META_HEAT, 0.0);
                let ring_pos = speed * (1.0 + heat) * age;
                let ring_dist = (distance - ring_pos).abs();
                if ring_dist >= *ring_width {
                    return EffectInfluence::ZERO;
                }
                let proximity = 1.0 - ring_dist / ring_width;
                let decay = 1.0 - age / duration;
                let intensity = proximity * decay * intensity_scale;
                if intensity <= 0.0 {
                    return EffectInfluence::ZERO;
                }
                let palette_override =
                    if intensity > BURST_PALETTE_THRESHOLD || heat > BURST_HOT_HEAT {
                        Some(BURST_CHARS)
                    } else {
                        None
                    };
                EffectInfluence {
                    height: 0.6 * intensity,
                    luminance: 0.5 * intensity,
                    char_override: None,
                    color_override: None,
                    palette_override,
                    intensity,
                }
            }

            EmitterEffect::HeightPulse {
                amplitude,
                peak_fraction,
                sigma,
                ..
            } => {
                let peak_time = (peak_fraction * duration).max(1e-4);
                let temporal = if age < peak_time {
                    age / peak_time
                } else {
                    1.0 - (age - peak_time) / (duration - peak_time).max(1e-4)
                };
                let temporal = temporal.max(0.0);
                let spatial = (-distance * distance / (2.0 * sigma * sigma)).exp();
                let intensity = temporal * spatial * intensity_scale;
                if intensity <= 0.0 {
                    return EffectInfluence::ZERO;
                }
                EffectInfluence {
                    height: amplitude * intensity,
                    luminance: 0.3 * intensity,
                    intensity,
                    ..EffectInfluence::ZERO
                }
            }

            EmitterEffect::Turbulence {
                amplitude,
                frequency,
                ..
            } => {
                let ramp_in = (age / TURBULENCE_RAMP_UP).min(1.0);
                let remaining = duration - age;
                let fade_out = (remaining / TURBULENCE_FADE_OUT).min(1.0);
                let envelope = (ramp_in * fade_out).max(0.0);
                let falloff = 1.0 - distance / radius.max(1e-4);
                let noise = (distance * frequency - age * 3.7).sin()
                    * (distance * frequency * 0.6 + age * 2.3).cos();
                let intensity = envelope * falloff * intensity_scale;
                if intensity <= 0.0 {
                    return EffectInfluence::ZERO;
                }
                EffectInfluence {
                    height: amplitude * envelope * falloff * noise,
                    luminance: 0.15 * envelope * falloff * noise,
                    intensity,
                    ..EffectInfluence::ZERO
                }
            }

            EmitterEffect::ColorWash { speed, ramp, .. } => {
                let front = speed * age;
                if distance > front {
                    return EffectInfluence::ZERO;
                }
                let behind = front - distance;
                let spatial = (1.0 - behind / radius.max(1e-4)).max(0.0);
                let decay = 1.0 - age / duration;
                let intensity = spatial * decay * intensity_scale;
                if intensity <= 0.0 {
                    return EffectInfluence::ZERO;
                }
                EffectInfluence {
                    height: 0.0,
                    luminance: 0.2 * intensity,
                    char_override: None,
                    color_override: Some(ramp.color_for(clamp01(intensity))),
                    palette_override: None,
                    intensity,
                }
            }

            EmitterEffect::Confetti { spread, .. } => {
                let density = meta_or(metadata, META_DENSITY, *spread);
                let decay = (1.0 - age / duration) * (1.0 - distance / radius.max(1e-4));
                if decay <= CONFETTI_VISIBILITY {
                    return EffectInfluence::ZERO;
                }
                let roll = hash01(distance, age);
                if roll > clamp01(density) {
                    return EffectInfluence::ZERO;
                }
                let pick = hash01(distance * 1.7 + 3.1, age * 0.9 + 5.7);
                let ch = CONFETTI_CHARS[(pick * CONFETTI_CHARS.len() as f32) as usize
                    % CONFETTI_CHARS.len()];
                let color = CONFETTI_COLORS[(hash01(distance + 11.3, age + 7.9)
                    * CONFETTI_COLORS.len() as f32) as usize
                    % CONFETTI_COLORS.len()];
                let intensity = decay * intensity_scale;
                if intensity <= 0.0 {
                    return EffectInfluence::ZERO;
                }
                EffectInfluence {
                    height: 0.0,
                    luminance: 0.4 * decay,
                    char_override: Some(ch),
                    color_override: Some(color),
                    palette_override: None,
                    intensity,
                }
            }
        }
    }
}

// --- Instances and manager ---

/// One live effect: the effect value anchored in the world, plus its clock.
#[derive(Debug, Clone)]
pub struct EmitterInstance {
    pub effect: EmitterEffect,
    pub position: Vec3,
    pub activated_at: f32,
    pub metadata: EffectMetadata,
    age: f32,
}

impl EmitterInstance {
    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn influence_at(&self, point: Vec3) -> EffectInfluence {
        let distance = (point - self.position).length();
        self.effect.influence(distance, self.age, &self.metadata)
    }
}

/// Owns the live effect instances: emission, aging, reaping, and point-query
/// aggregation. Fire-and-forget from the caller's side.
#[derive(Debug, Default)]
pub struct EmitterManager {
    instances: Vec<EmitterInstance>,
}

impl EmitterManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(
        &mut self,
        effect: EmitterEffect,
        position: Vec3,
        now: f32,
        metadata: EffectMetadata,
    ) {
        self.instances.push(EmitterInstance {
            effect,
            position,
            activated_at: now,
            metadata,
            age: 0.0,
        });
    }

    /// Advances every instance's clock and reaps the expired.
    pub fn update(&mut self, dt: f32) {
        for instance in &mut self.instances {
            instance.age += dt;
        }
        self.instances
            .retain(|i| i.age < i.effect.effective_duration(&i.metadata));
    }

    /// Sum of all live influences with positive intensity at `point`.
    pub fn influence_at(&self, point: Vec3) -> EffectInfluence {
        let mut total = EffectInfluence::ZERO;
        for instance in &self.instances {
            let influence = instance.influence_at(point);
            if influence.intensity > 0.0 {
                total = total + influence;
            }
        }
        total
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[EmitterInstance] {
        &self.instances
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }
}
