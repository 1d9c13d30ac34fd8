//! OpenGL version probe
//!
//! Builds the smallest thing a legacy GL context can live on: a registered
//! window class, a hidden 1x1 window and its device context. Each resource
//! is held by a drop guard so every exit path releases what was acquired,
//! newest first.

use scopeguard::guard;
use tracing::{debug, info};

use crate::{GlProbeError, PixelFormatRequest, ProbeError, ProbeSettings};

/// Strings queried with `glGetString`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlString {
    Vendor,
    Renderer,
    Version,
    ShadingLanguageVersion,
}

impl GlString {
    pub const fn code(self) -> u32 {
        match self {
            GlString::Vendor => 0x1f00,
            GlString::Renderer => 0x1f01,
            GlString::Version => 0x1f02,
            GlString::ShadingLanguageVersion => 0x8b8c,
        }
    }
}

/// Native windowing and context calls used by the probe.
///
/// Release methods take their handle by value and must tolerate being
/// called after a failed acquisition further down the chain.
pub trait GlBackend {
    type Class;
    type Window;
    type DeviceContext;
    type Context;

    fn register_class(&self, name: &str) -> Result<Self::Class, ProbeError>;
    fn unregister_class(&self, class: Self::Class);

    /// Hidden 1x1 window of `class`.
    fn create_window(&self, class: &Self::Class) -> Result<Self::Window, ProbeError>;
    fn destroy_window(&self, window: Self::Window);

    fn device_context(&self, window: &Self::Window) -> Result<Self::DeviceContext, ProbeError>;
    fn release_device_context(&self, window: &Self::Window, dc: Self::DeviceContext);

    fn set_pixel_format(
        &self,
        dc: &Self::DeviceContext,
        request: &PixelFormatRequest,
    ) -> Result<(), ProbeError>;

    fn create_context(&self, dc: &Self::DeviceContext) -> Result<Self::Context, ProbeError>;
    fn delete_context(&self, context: Self::Context);

    fn make_current(
        &self,
        dc: &Self::DeviceContext,
        context: &Self::Context,
    ) -> Result<(), ProbeError>;
    fn clear_current(&self);

    /// `None` when the driver returns a null string.
    fn get_string(&self, name: GlString) -> Option<String>;
}

/// Strings reported by the active context. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlInfo {
    pub version: Option<String>,
    pub vendor: Option<String>,
    pub renderer: Option<String>,
    pub shading_language_version: Option<String>,
}

/// Create a throwaway context, read its strings and tear everything down.
pub fn probe_opengl<B: GlBackend>(
    backend: &B,
    settings: &ProbeSettings,
) -> Result<GlInfo, GlProbeError> {
    let class = guard(
        backend
            .register_class(&settings.gl_window_class)
            .map_err(GlProbeError::WindowClass)?,
        |class| backend.unregister_class(class),
    );

    let window = guard(
        backend.create_window(&class).map_err(GlProbeError::Window)?,
        |window| backend.destroy_window(window),
    );

    let dc = guard(
        backend
            .device_context(&window)
            .map_err(GlProbeError::DeviceContext)?,
        |dc| backend.release_device_context(&window, dc),
    );

    backend
        .set_pixel_format(&dc, &settings.pixel_format)
        .map_err(GlProbeError::PixelFormat)?;
    debug!("pixel format set");

    let context = guard(
        backend.create_context(&dc).map_err(GlProbeError::Context)?,
        |context| backend.delete_context(context),
    );

    // Armed before activation so a half-applied make_current is undone too.
    let _current = guard((), |()| backend.clear_current());
    backend
        .make_current(&dc, &context)
        .map_err(GlProbeError::Context)?;

    let info = GlInfo {
        version: backend.get_string(GlString::Version),
        vendor: backend.get_string(GlString::Vendor),
        renderer: backend.get_string(GlString::Renderer),
        shading_language_version: backend.get_string(GlString::ShadingLanguageVersion),
    };
    info!(version = ?info.version, renderer = ?info.renderer, "OpenGL context queried");

    Ok(info)
}
