use crate::math::Vec2;

/// Background activity density sampled over the unit square. Implementations
/// may back this with any grid resolution; the heightfield queries
/// proportionally mapped coordinates in [0, 1] x [0, 1] and expects values
/// in [0, 1].
pub trait DensitySource {
    fn density(&self, u: f32, v: f32) -> f32;
}

/// Flat density for tests and empty scenes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformDensity(pub f32);

impl DensitySource for UniformDensity {
    fn density(&self, _u: f32, _v: f32) -> f32 {
        self.0
    }
}

/// Discrete activity phases, ordered by the height of the terrain peak each
/// produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActivityLevel {
    Idle,
    Active,
    Processing,
    Spawning,
}

impl ActivityLevel {
    /// Peak amplitude for the entity's Gaussian bump. Strictly increasing
    /// with activity.
    pub fn amplitude(self) -> f32 {
        match self {
            ActivityLevel::Idle => 0.5,
            ActivityLevel::Active => 1.4,
            ActivityLevel::Processing => 2.4,
            ActivityLevel::Spawning => 3.2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ActivityLevel::Idle => "idle",
            ActivityLevel::Active => "active",
            ActivityLevel::Processing => "processing",
            ActivityLevel::Spawning => "spawning",
        }
    }
}

/// A named entity on the terrain. Position is in heightfield world
/// coordinates (x along width, y along depth). The group label is carried
/// for external layout only; the phase tag drives the optional per-point
/// palette blend.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub position: Vec2,
    pub activity: ActivityLevel,
    pub group: Option<String>,
    pub phase: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, position: Vec2, activity: ActivityLevel) -> Self {
        Self {
            name: name.into(),
            position,
            activity,
            group: None,
            phase: String::new(),
        }
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A link between two entity positions. Only active connections raise a
/// ridge; progress in [0, 1] scales its amplitude.
#[derive(Debug, Clone, Copy)]
pub struct Connection {
    pub from: Vec2,
    pub to: Vec2,
    pub active: bool,
    pub progress: f32,
}

impl Connection {
    pub fn new(from: Vec2, to: Vec2) -> Self {
        Self {
            from,
            to,
            active: true,
            progress: 1.0,
        }
    }
}
