//! cogwave renders a continuously evolving 3D terrain — a cognitive
//! waveform — as a grid of styled text cells.
//!
//! Upstream collaborators describe abstract state: background activity
//! density, named entities with positions and activity phases, and
//! connections between them. The pipeline builds a height field from that
//! state, lights it, and rasterizes it via depth-sorted projection into a
//! [`cell::CellBuffer`] of character + color cells, which downstream
//! adapters blit to a concrete surface (ANSI stream, canvas, text widget).
//! Transient emitter effects (bursts, pulses, turbulence, washes, confetti)
//! perturb the same pipeline without being part of persistent state.
//!
//! The whole pipeline is synchronous and single-threaded: one
//! `update`/`render` pair per animation frame, buffers reused in place.

pub mod camera;
pub mod cell;
pub mod demo;
pub mod dither;
pub mod effects;
pub mod heightfield;
pub mod lighting;
pub mod math;
pub mod palette;
pub mod rasterizer;
pub mod scene;

pub use camera::{Camera, OrbitRig, Projection, ProjectionKind, ScreenProjector};
pub use cell::{rgb_to_ansi256, AsciiCell, CellBuffer};
pub use dither::BayerDither;
pub use effects::{EffectInfluence, EffectMetadata, EmitterEffect, EmitterManager};
pub use heightfield::Heightfield;
pub use lighting::SurfaceLighting;
pub use math::{Vec2, Vec3};
pub use palette::{AsciiLuminancePalette, CognitiveColorRamp};
pub use rasterizer::{FrameInput, PhaseBlend, PhaseStyle, Rasterizer};
pub use scene::{ActivityLevel, Connection, DensitySource, Entity};
