//! Win32 window + WGL context backend for the OpenGL probe.

#[cfg(target_os = "windows")]
pub use self::native::WglBackend;

#[cfg(not(target_os = "windows"))]
pub use self::unsupported::WglBackend;

/* -------------------------- Windows -------------------------- */

#[cfg(target_os = "windows")]
mod native {
    use std::ffi::{c_char, CStr};
    use std::ptr;

    use gfxcaps_core::gl::{GlBackend, GlString};
    use gfxcaps_core::{PixelFormatRequest, ProbeError};
    use tracing::{debug, warn};
    use windows_sys::Win32::Foundation::{GetLastError, ERROR_CLASS_ALREADY_EXISTS, HINSTANCE, HWND};
    use windows_sys::Win32::Graphics::Gdi::{GetDC, ReleaseDC, HDC};
    use windows_sys::Win32::Graphics::OpenGL::{
        glGetString, wglCreateContext, wglDeleteContext, wglMakeCurrent, ChoosePixelFormat,
        SetPixelFormat, HGLRC, PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW, PFD_SUPPORT_OPENGL,
        PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR,
    };
    use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, RegisterClassW, UnregisterClassW,
        CS_OWNDC, WNDCLASSW,
    };

    fn last_error(call: &'static str) -> ProbeError {
        ProbeError::win32(call, unsafe { GetLastError() })
    }

    /// Registered window class. `owned` is false when another caller in the
    /// process registered it first, in which case it is left registered.
    pub struct WglClass {
        name: Vec<u16>,
        instance: HINSTANCE,
        owned: bool,
    }

    pub struct WglWindow(HWND);
    pub struct WglDc(HDC);
    pub struct WglContext(HGLRC);

    /// Stateless; every handle it hands out is owned by the probe.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WglBackend;

    impl WglBackend {
        pub fn new() -> Self {
            Self
        }
    }

    impl GlBackend for WglBackend {
        type Class = WglClass;
        type Window = WglWindow;
        type DeviceContext = WglDc;
        type Context = WglContext;

        fn register_class(&self, name: &str) -> Result<WglClass, ProbeError> {
            let name: Vec<u16> = name.encode_utf16().chain(Some(0)).collect();
            let instance = unsafe { GetModuleHandleW(ptr::null()) };
            if instance.is_null() {
                return Err(last_error("GetModuleHandleW"));
            }

            let class = WNDCLASSW {
                style: CS_OWNDC,
                lpfnWndProc: Some(DefWindowProcW),
                hInstance: instance,
                lpszClassName: name.as_ptr(),
                ..Default::default()
            };

            let owned = if unsafe { RegisterClassW(&class) } != 0 {
                true
            } else {
                let err = unsafe { GetLastError() };
                if err != ERROR_CLASS_ALREADY_EXISTS {
                    return Err(ProbeError::win32("RegisterClassW", err));
                }
                debug!("window class already registered, reusing it");
                false
            };

            Ok(WglClass {
                name,
                instance,
                owned,
            })
        }

        fn unregister_class(&self, class: WglClass) {
            if class.owned && unsafe { UnregisterClassW(class.name.as_ptr(), class.instance) } == 0 {
                warn!(error = %last_error("UnregisterClassW"), "window class left registered");
            }
        }

        fn create_window(&self, class: &WglClass) -> Result<WglWindow, ProbeError> {
            // No WS_VISIBLE: the window is never shown.
            let hwnd = unsafe {
                CreateWindowExW(
                    0,
                    class.name.as_ptr(),
                    class.name.as_ptr(),
                    0,
                    0,
                    0,
                    1,
                    1,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    class.instance,
                    ptr::null(),
                )
            };
            if hwnd.is_null() {
                return Err(last_error("CreateWindowExW"));
            }
            Ok(WglWindow(hwnd))
        }

        fn destroy_window(&self, window: WglWindow) {
            if unsafe { DestroyWindow(window.0) } == 0 {
                warn!(error = %last_error("DestroyWindow"), "dummy window not destroyed");
            }
        }

        fn device_context(&self, window: &WglWindow) -> Result<WglDc, ProbeError> {
            let hdc = unsafe { GetDC(window.0) };
            if hdc.is_null() {
                return Err(last_error("GetDC"));
            }
            Ok(WglDc(hdc))
        }

        fn release_device_context(&self, window: &WglWindow, dc: WglDc) {
            unsafe { ReleaseDC(window.0, dc.0) };
        }

        fn set_pixel_format(
            &self,
            dc: &WglDc,
            request: &PixelFormatRequest,
        ) -> Result<(), ProbeError> {
            let mut flags = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL;
            if request.double_buffer {
                flags |= PFD_DOUBLEBUFFER;
            }
            let pfd = PIXELFORMATDESCRIPTOR {
                nSize: std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16,
                nVersion: 1,
                dwFlags: flags,
                iPixelType: PFD_TYPE_RGBA,
                cColorBits: request.color_bits,
                cDepthBits: request.depth_bits,
                ..Default::default()
            };

            let format = unsafe { ChoosePixelFormat(dc.0, &pfd) };
            if format == 0 {
                return Err(last_error("ChoosePixelFormat"));
            }
            if unsafe { SetPixelFormat(dc.0, format, &pfd) } == 0 {
                return Err(last_error("SetPixelFormat"));
            }
            debug!(format, "pixel format selected");
            Ok(())
        }

        fn create_context(&self, dc: &WglDc) -> Result<WglContext, ProbeError> {
            let context = unsafe { wglCreateContext(dc.0) };
            if context.is_null() {
                return Err(last_error("wglCreateContext"));
            }
            Ok(WglContext(context))
        }

        fn delete_context(&self, context: WglContext) {
            if unsafe { wglDeleteContext(context.0) } == 0 {
                warn!(error = %last_error("wglDeleteContext"), "GL context not deleted");
            }
        }

        fn make_current(&self, dc: &WglDc, context: &WglContext) -> Result<(), ProbeError> {
            if unsafe { wglMakeCurrent(dc.0, context.0) } == 0 {
                return Err(last_error("wglMakeCurrent"));
            }
            Ok(())
        }

        fn clear_current(&self) {
            unsafe { wglMakeCurrent(ptr::null_mut(), ptr::null_mut()) };
        }

        fn get_string(&self, name: GlString) -> Option<String> {
            let value = unsafe { glGetString(name.code()) };
            if value.is_null() {
                return None;
            }
            // Safety: non-null glGetString results are NUL-terminated and
            // live as long as the current context.
            let value = unsafe { CStr::from_ptr(value as *const c_char) };
            Some(value.to_string_lossy().into_owned())
        }
    }
}

/* --------------------- Other targets --------------------- */

#[cfg(not(target_os = "windows"))]
mod unsupported {
    use gfxcaps_core::gl::{GlBackend, GlString};
    use gfxcaps_core::{PixelFormatRequest, ProbeError};

    /// Stand-in that fails at the first step; no windowing system is assumed.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WglBackend;

    impl WglBackend {
        pub fn new() -> Self {
            Self
        }
    }

    fn unsupported(call: &'static str) -> ProbeError {
        ProbeError::Unsupported { call }
    }

    impl GlBackend for WglBackend {
        type Class = ();
        type Window = ();
        type DeviceContext = ();
        type Context = ();

        fn register_class(&self, _name: &str) -> Result<(), ProbeError> {
            Err(unsupported("RegisterClassW"))
        }

        fn unregister_class(&self, _class: ()) {}

        fn create_window(&self, _class: &()) -> Result<(), ProbeError> {
            Err(unsupported("CreateWindowExW"))
        }

        fn destroy_window(&self, _window: ()) {}

        fn device_context(&self, _window: &()) -> Result<(), ProbeError> {
            Err(unsupported("GetDC"))
        }

        fn release_device_context(&self, _window: &(), _dc: ()) {}

        fn set_pixel_format(&self, _dc: &(), _request: &PixelFormatRequest) -> Result<(), ProbeError> {
            Err(unsupported("SetPixelFormat"))
        }

        fn create_context(&self, _dc: &()) -> Result<(), ProbeError> {
            Err(unsupported("wglCreateContext"))
        }

        fn delete_context(&self, _context: ()) {}

        fn make_current(&self, _dc: &(), _context: &()) -> Result<(), ProbeError> {
            Err(unsupported("wglMakeCurrent"))
        }

        fn clear_current(&self) {}

        fn get_string(&self, _name: GlString) -> Option<String> {
            None
        }
    }

}
