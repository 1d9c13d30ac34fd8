//! gfxcaps
//!
//! Reports D3D11 feature levels per adapter, then the OpenGL version.

use std::io::{self, Write};

use anyhow::Result;
use gfxcaps_core::ProbeSettings;

fn main() -> Result<()> {
    gfxcaps_runtime::init_logging();
    tracing::info!("gfxcaps v{}", gfxcaps_core::VERSION);

    let settings = ProbeSettings::default();
    let mut out = io::stdout().lock();

    gfxcaps_runtime::probe_d3d11(&settings, &mut out)?;
    gfxcaps_runtime::probe_opengl(&settings, &mut out)?;

    out.flush()?;
    Ok(())
}
