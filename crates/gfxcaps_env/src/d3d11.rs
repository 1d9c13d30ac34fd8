//! D3D11 runtime and DXGI adapter enumeration.
//! `d3d11.dll` is loaded at probe time so a missing runtime is a report line,
//! not a process that fails to start.

#[cfg(target_os = "windows")]
pub use self::native::{load_d3d11, D3d11Device, D3d11Runtime, DxgiAdapters};

#[cfg(not(target_os = "windows"))]
pub use self::unsupported::{load_d3d11, D3d11Device, D3d11Runtime, DxgiAdapter, DxgiAdapters};

/* -------------------------- Windows -------------------------- */

#[cfg(target_os = "windows")]
mod native {
    use std::ffi::c_void;
    use std::ptr;

    use gfxcaps_core::dx::{AdapterSource, CreatedDevice, DeviceRuntime, DriverKind, ProbedDevice};
    use gfxcaps_core::{AdapterDescriptor, FeatureLevel, ProbeError};
    use libloading::Library;
    use tracing::{debug, info};
    use windows::core::{Interface, HRESULT};
    use windows::Win32::Foundation::E_POINTER;
    use windows::Win32::Graphics::Direct3D::{
        D3D_DRIVER_TYPE, D3D_DRIVER_TYPE_UNKNOWN, D3D_DRIVER_TYPE_WARP, D3D_FEATURE_LEVEL,
    };
    use windows::Win32::Graphics::Direct3D11::{
        ID3D11Device, ID3D11DeviceContext, D3D11_SDK_VERSION,
    };
    use windows::Win32::Graphics::Dxgi::{
        CreateDXGIFactory1, IDXGIAdapter, IDXGIDevice, IDXGIFactory1, DXGI_ADAPTER_DESC,
        DXGI_ERROR_NOT_FOUND,
    };

    const D3D11_DLL: &str = "d3d11.dll";

    type D3D11CreateDeviceFn = unsafe extern "system" fn(
        adapter: *mut c_void,
        driver_type: D3D_DRIVER_TYPE,
        software: *mut c_void,
        flags: u32,
        feature_levels: *const D3D_FEATURE_LEVEL,
        feature_level_count: u32,
        sdk_version: u32,
        device: *mut Option<ID3D11Device>,
        feature_level: *mut D3D_FEATURE_LEVEL,
        immediate_context: *mut Option<ID3D11DeviceContext>,
    ) -> HRESULT;

    fn hresult(call: &'static str, err: &windows::core::Error) -> ProbeError {
        ProbeError::hresult(call, err.code().0)
    }

    fn descriptor(desc: &DXGI_ADAPTER_DESC) -> AdapterDescriptor {
        AdapterDescriptor {
            name: AdapterDescriptor::name_from_utf16(&desc.Description),
            vendor_id: desc.VendorId,
            device_id: desc.DeviceId,
            dedicated_video_memory: desc.DedicatedVideoMemory as u64,
            shared_system_memory: desc.SharedSystemMemory as u64,
        }
    }

    /// Loaded `d3d11.dll`. The library is freed when this is dropped.
    pub struct D3d11Runtime {
        create_device: D3D11CreateDeviceFn,
        // Declared last: dropped after anything resolved from it.
        _library: Library,
    }

    pub fn load_d3d11() -> Result<D3d11Runtime, ProbeError> {
        let missing = |err: libloading::Error| ProbeError::LibraryMissing {
            library: D3D11_DLL,
            reason: err.to_string(),
        };

        // Safety: system runtime DLL, its initialisers are benign.
        let library = unsafe { Library::new(D3D11_DLL) }.map_err(missing)?;
        let create_device = unsafe { library.get::<D3D11CreateDeviceFn>(b"D3D11CreateDevice\0") }
            .map(|symbol| *symbol)
            .map_err(missing)?;

        info!("loaded {D3D11_DLL}");
        Ok(D3d11Runtime {
            create_device,
            _library: library,
        })
    }

    impl DeviceRuntime for D3d11Runtime {
        type Adapters = DxgiAdapters;
        type Device = D3d11Device;

        fn adapter_source(&self) -> Result<DxgiAdapters, ProbeError> {
            let factory: IDXGIFactory1 =
                unsafe { CreateDXGIFactory1() }.map_err(|e| hresult("CreateDXGIFactory1", &e))?;
            Ok(DxgiAdapters { factory })
        }

        fn create_device(
            &self,
            driver: DriverKind<'_, IDXGIAdapter>,
            levels: &[FeatureLevel],
        ) -> Result<CreatedDevice<D3d11Device>, ProbeError> {
            let requested: Vec<D3D_FEATURE_LEVEL> = levels
                .iter()
                .map(|level| D3D_FEATURE_LEVEL(level.code() as i32))
                .collect();

            // A specific adapter requires DRIVER_TYPE_UNKNOWN; WARP takes none.
            let (adapter, driver_type) = match driver {
                DriverKind::Hardware(adapter) => (adapter.as_raw(), D3D_DRIVER_TYPE_UNKNOWN),
                DriverKind::Software => (ptr::null_mut(), D3D_DRIVER_TYPE_WARP),
            };

            let mut device: Option<ID3D11Device> = None;
            let mut context: Option<ID3D11DeviceContext> = None;
            let mut obtained = D3D_FEATURE_LEVEL(0);

            let hr = unsafe {
                (self.create_device)(
                    adapter,
                    driver_type,
                    ptr::null_mut(),
                    0,
                    requested.as_ptr(),
                    requested.len() as u32,
                    D3D11_SDK_VERSION,
                    &mut device,
                    &mut obtained,
                    &mut context,
                )
            };
            hr.ok().map_err(|e| hresult("D3D11CreateDevice", &e))?;

            let (Some(device), Some(context)) = (device, context) else {
                return Err(ProbeError::hresult("D3D11CreateDevice", E_POINTER.0));
            };
            debug!("D3D11 device created at level 0x{:x}", obtained.0);

            Ok(CreatedDevice {
                device: D3d11Device {
                    _context: context,
                    device,
                },
                level_code: obtained.0 as u32,
            })
        }
    }

    /// DXGI factory used for enumeration.
    pub struct DxgiAdapters {
        factory: IDXGIFactory1,
    }

    impl AdapterSource for DxgiAdapters {
        type Adapter = IDXGIAdapter;

        fn adapter(&self, index: u32) -> Result<Option<IDXGIAdapter>, ProbeError> {
            match unsafe { self.factory.EnumAdapters(index) } {
                Ok(adapter) => Ok(Some(adapter)),
                Err(err) if err.code() == DXGI_ERROR_NOT_FOUND => Ok(None),
                Err(err) => Err(hresult("IDXGIFactory::EnumAdapters", &err)),
            }
        }

        fn describe(&self, adapter: &IDXGIAdapter) -> Result<AdapterDescriptor, ProbeError> {
            let desc = unsafe { adapter.GetDesc() }.map_err(|e| hresult("IDXGIAdapter::GetDesc", &e))?;
            Ok(descriptor(&desc))
        }
    }

    /// Device and immediate context; released context first on drop.
    pub struct D3d11Device {
        _context: ID3D11DeviceContext,
        device: ID3D11Device,
    }

    impl ProbedDevice for D3d11Device {
        fn adapter_descriptor(&self) -> Result<AdapterDescriptor, ProbeError> {
            let dxgi: IDXGIDevice = self
                .device
                .cast()
                .map_err(|e| hresult("ID3D11Device::QueryInterface(IDXGIDevice)", &e))?;
            let adapter =
                unsafe { dxgi.GetAdapter() }.map_err(|e| hresult("IDXGIDevice::GetAdapter", &e))?;
            let desc =
                unsafe { adapter.GetDesc() }.map_err(|e| hresult("IDXGIAdapter::GetDesc", &e))?;
            Ok(descriptor(&desc))
        }
    }
}

/* --------------------- Other targets --------------------- */

#[cfg(not(target_os = "windows"))]
mod unsupported {
    use gfxcaps_core::dx::{AdapterSource, CreatedDevice, DeviceRuntime, DriverKind, ProbedDevice};
    use gfxcaps_core::{AdapterDescriptor, FeatureLevel, ProbeError};

    /// Never constructed: there is no D3D11 runtime off Windows.
    pub enum D3d11Runtime {}
    pub enum DxgiAdapters {}
    pub enum DxgiAdapter {}
    pub enum D3d11Device {}

    pub fn load_d3d11() -> Result<D3d11Runtime, ProbeError> {
        Err(ProbeError::Unsupported {
            call: "D3D11CreateDevice",
        })
    }

    impl DeviceRuntime for D3d11Runtime {
        type Adapters = DxgiAdapters;
        type Device = D3d11Device;

        fn adapter_source(&self) -> Result<DxgiAdapters, ProbeError> {
            match *self {}
        }

        fn create_device(
            &self,
            _driver: DriverKind<'_, DxgiAdapter>,
            _levels: &[FeatureLevel],
        ) -> Result<CreatedDevice<D3d11Device>, ProbeError> {
            match *self {}
        }
    }

    impl AdapterSource for DxgiAdapters {
        type Adapter = DxgiAdapter;

        fn adapter(&self, _index: u32) -> Result<Option<DxgiAdapter>, ProbeError> {
            match *self {}
        }

        fn describe(&self, _adapter: &DxgiAdapter) -> Result<AdapterDescriptor, ProbeError> {
            match *self {}
        }
    }

    impl ProbedDevice for D3d11Device {
        fn adapter_descriptor(&self) -> Result<AdapterDescriptor, ProbeError> {
            match *self {}
        }
    }

}
