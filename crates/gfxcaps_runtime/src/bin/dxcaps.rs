//! dxcaps
//!
//! D3D11 half of gfxcaps: adapters and feature levels only.

use std::io::{self, Write};

use anyhow::Result;
use gfxcaps_core::ProbeSettings;

fn main() -> Result<()> {
    gfxcaps_runtime::init_logging();
    tracing::info!("dxcaps v{}", gfxcaps_core::VERSION);

    let mut out = io::stdout().lock();
    gfxcaps_runtime::probe_d3d11(&ProbeSettings::default(), &mut out)?;

    out.flush()?;
    Ok(())
}
