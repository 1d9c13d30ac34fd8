//! Gfxcaps Core
//!
//! Platform-agnostic graphics capability probes:
//! - Direct3D 11 adapter enumeration and feature-level negotiation
//! - OpenGL context creation and version query
//! - Plain-text report rendering
//!
//! Native APIs sit behind the traits in [`dx`] and [`gl`]; `gfxcaps_env`
//! provides the real implementations.

pub mod adapter;
pub mod dx;
pub mod error;
pub mod feature_level;
pub mod gl;
pub mod report;
pub mod settings;

pub use adapter::AdapterDescriptor;
pub use error::{GlProbeError, ProbeError, Status};
pub use feature_level::FeatureLevel;
pub use settings::{PixelFormatRequest, ProbeSettings};

/// Tool version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
