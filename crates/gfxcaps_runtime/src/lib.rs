//! Gfxcaps Runtime
//!
//! Shared wiring for the `gfxcaps` and `dxcaps` binaries: logging setup and
//! the native backends plugged into the core probes.

use std::io::Write;

use anyhow::Result;
use gfxcaps_core::{dx, gl, report, ProbeSettings};
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so stdout carries only the report.
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// D3D11 runtime check, adapter enumeration and per-adapter feature levels.
pub fn probe_d3d11<W: Write + ?Sized>(settings: &ProbeSettings, out: &mut W) -> Result<()> {
    dx::run(gfxcaps_env::load_d3d11, settings, out)?;
    Ok(())
}

/// Throwaway WGL context and its version strings.
pub fn probe_opengl<W: Write + ?Sized>(settings: &ProbeSettings, out: &mut W) -> Result<()> {
    let result = gl::probe_opengl(&gfxcaps_env::WglBackend::new(), settings);
    if let Err(err) = &result {
        tracing::warn!(error = %err, "OpenGL probe failed");
    }
    report::write_gl_result(out, &result)?;
    Ok(())
}
