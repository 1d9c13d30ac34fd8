//! Plain-text report
//!
//! Everything the user sees goes through here, one line per fact.
//! Diagnostics for developers go through `tracing` instead.

use std::io::{self, Write};

use crate::dx::{DeviceOutcome, DeviceReport, DriverPath};
use crate::feature_level::{code_name, LevelMatch};
use crate::gl::GlInfo;
use crate::{AdapterDescriptor, GlProbeError, ProbeError};

const SEPARATOR: &str = "==================================";
const UNKNOWN: &str = "Unknown";

/// The bare status code where there is one, otherwise the full message.
fn status_text(err: &ProbeError) -> String {
    match err.status() {
        Some(status) => status.to_string(),
        None => err.to_string(),
    }
}

pub fn write_runtime_missing<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    writeln!(out, "DX11 runtime not present")
}

pub fn write_runtime_found<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    writeln!(out, "DX11 runtime found")
}

pub fn write_factory_failure<W: Write + ?Sized>(out: &mut W, err: &ProbeError) -> io::Result<()> {
    writeln!(out, "Failed to create DXGI factory ({})", status_text(err))
}

pub fn write_enumeration_failure<W: Write + ?Sized>(
    out: &mut W,
    err: &ProbeError,
) -> io::Result<()> {
    writeln!(out, "Adapter enumeration stopped ({err})")
}

/// The descriptor as seen at enumeration time.
pub fn write_enumerated_adapter<W: Write + ?Sized>(
    out: &mut W,
    index: u32,
    descriptor: &Result<AdapterDescriptor, ProbeError>,
) -> io::Result<()> {
    match descriptor {
        Ok(desc) => {
            writeln!(out, "Adapter {index}: {}", desc.name)?;
            writeln!(out, "  VendorId: {}, DeviceId: {}", desc.vendor_id, desc.device_id)?;
            writeln!(out, "  Dedicated Video Memory: {} MB", desc.dedicated_video_mb())?;
            writeln!(out, "  Shared System Memory: {} MB", desc.shared_system_mb())
        }
        Err(err) => {
            writeln!(out, "Adapter {index}: <unknown>")?;
            writeln!(out, "  Description unavailable ({err})")
        }
    }
}

pub fn write_device_outcome<W: Write + ?Sized>(
    out: &mut W,
    outcome: &DeviceOutcome,
) -> io::Result<()> {
    match outcome {
        DeviceOutcome::Created(report) => write_device_report(out, report),
        DeviceOutcome::Failed { hardware, software } => {
            writeln!(out, "Failed to create DX11 device ({})", status_text(hardware))?;
            if let Some(software) = software {
                writeln!(
                    out,
                    "Failed to create WARP software device ({})",
                    status_text(software)
                )?;
            }
            Ok(())
        }
    }
}

fn write_device_report<W: Write + ?Sized>(out: &mut W, report: &DeviceReport) -> io::Result<()> {
    if let Some(hardware) = &report.hardware_error {
        writeln!(out, "Failed to create DX11 device ({})", status_text(hardware))?;
    }
    if report.driver == DriverPath::Software {
        writeln!(out, "Using WARP software device")?;
    }

    writeln!(out, "DX11 device created")?;
    writeln!(out, "Feature level: {}", code_name(report.level_code))?;

    match report.level_match {
        LevelMatch::Listed { .. } => {
            writeln!(
                out,
                "All supported feature levels (assumed from obtained level, not verified):"
            )?;
            for level in &report.supported_levels {
                writeln!(out, "  {level}")?;
            }
        }
        LevelMatch::Unlisted { .. } => {
            writeln!(out, "Warning: obtained feature level not found in requested levels")?;
        }
    }

    match &report.device_adapter {
        Ok(desc) => {
            writeln!(out, "Adapter: {}", desc.name)?;
            writeln!(out, "Video memory: {} MB", desc.dedicated_video_mb())
        }
        Err(err) => writeln!(out, "Adapter info unavailable via device ({err})"),
    }
}

pub fn write_gl_result<W: Write + ?Sized>(
    out: &mut W,
    result: &Result<GlInfo, GlProbeError>,
) -> io::Result<()> {
    let info = match result {
        Ok(info) => info,
        Err(err) => return writeln!(out, "{err}"),
    };

    let or_unknown = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());

    writeln!(out, "{SEPARATOR}")?;
    writeln!(out, "OpenGL Version: {}", or_unknown(&info.version))?;
    writeln!(out, "OpenGL Vendor: {}", or_unknown(&info.vendor))?;
    writeln!(out, "OpenGL Renderer: {}", or_unknown(&info.renderer))?;
    writeln!(out, "GLSL Version: {}", or_unknown(&info.shading_language_version))
}
