//! Gfxcaps Platform Layer
//!
//! Native implementations of the probe traits in `gfxcaps_core`:
//! - `d3d11`: D3D11 runtime loaded from `d3d11.dll`, DXGI adapter enumeration
//! - `wgl`: hidden Win32 window plus a legacy WGL context
//!
//! Other targets get stand-ins that report the subsystem as unavailable.

pub mod d3d11;
pub mod wgl;

pub use d3d11::{load_d3d11, D3d11Runtime};
pub use wgl::WglBackend;
