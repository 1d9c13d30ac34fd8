use std::fmt;

use thiserror::Error;

/// Failure of a single native call or of a whole subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("{library} could not be loaded: {reason}")]
    LibraryMissing { library: &'static str, reason: String },

    #[error("{call} failed ({status})")]
    Platform { call: &'static str, status: Status },

    #[error("{call} is not available on this platform")]
    Unsupported { call: &'static str },
}

/// Code returned by a failed native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// COM result (DXGI, D3D11).
    Hresult(u32),
    /// `GetLastError` value (user32, gdi32, opengl32).
    Win32(u32),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Hresult(code) => write!(f, "hr=0x{code:08x}"),
            Status::Win32(code) => write!(f, "error={code}"),
        }
    }
}

impl ProbeError {
    /// HRESULTs arrive as `i32` from `windows` and as `u32` constants.
    pub fn hresult(call: &'static str, code: impl Into<i64>) -> Self {
        let code: i64 = code.into();
        Self::Platform {
            call,
            status: Status::Hresult(code as u32),
        }
    }

    pub fn win32(call: &'static str, code: u32) -> Self {
        Self::Platform {
            call,
            status: Status::Win32(code),
        }
    }

    /// The bare code of a failed call; `None` for whole-subsystem failures.
    pub fn status(&self) -> Option<Status> {
        match self {
            ProbeError::Platform { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the subsystem as a whole is missing rather than one call failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ProbeError::LibraryMissing { .. } | ProbeError::Unsupported { .. }
        )
    }
}

/// The stage at which the OpenGL probe gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlProbeError {
    #[error("Failed to register dummy window class ({0})")]
    WindowClass(ProbeError),

    #[error("Failed to create dummy window for OpenGL ({0})")]
    Window(ProbeError),

    #[error("Failed to get device context for dummy window ({0})")]
    DeviceContext(ProbeError),

    #[error("Failed to set pixel format ({0})")]
    PixelFormat(ProbeError),

    #[error("Failed to create OpenGL context ({0})")]
    Context(ProbeError),
}
