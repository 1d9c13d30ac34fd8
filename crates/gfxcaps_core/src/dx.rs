//! Direct3D 11 adapter enumeration and feature-level probe
//!
//! Flow per adapter: hardware device on that adapter, one WARP retry on
//! failure, feature-level listing, then adapter metadata read back through
//! the created device. A failing adapter never stops enumeration.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use crate::feature_level::{implied_levels, match_obtained, LevelMatch};
use crate::{report, AdapterDescriptor, FeatureLevel, ProbeError, ProbeSettings};

/// Which driver a device was created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPath {
    Hardware,
    /// WARP software rasterizer
    Software,
}

/// Target of a device-creation request.
#[derive(Debug)]
pub enum DriverKind<'a, A> {
    /// Hardware driver of a specific enumerated adapter.
    Hardware(&'a A),
    /// WARP, not tied to any enumerated adapter.
    Software,
}

/// A device plus the raw level code the platform negotiated.
pub struct CreatedDevice<D> {
    pub device: D,
    pub level_code: u32,
}

/// A live device. Dropping it releases the device and its immediate context.
pub trait ProbedDevice {
    /// Adapter description reached through the device itself
    /// (device -> DXGI device -> adapter -> descriptor).
    fn adapter_descriptor(&self) -> Result<AdapterDescriptor, ProbeError>;
}

/// Platform adapter enumeration (a DXGI factory).
pub trait AdapterSource {
    type Adapter;

    /// `Ok(None)` once `index` runs past the last adapter.
    fn adapter(&self, index: u32) -> Result<Option<Self::Adapter>, ProbeError>;

    fn describe(&self, adapter: &Self::Adapter) -> Result<AdapterDescriptor, ProbeError>;
}

/// A loaded D3D11 runtime. Dropping it unloads the runtime library.
pub trait DeviceRuntime {
    type Adapters: AdapterSource;
    type Device: ProbedDevice;

    fn adapter_source(&self) -> Result<Self::Adapters, ProbeError>;

    /// Create a device at the first level of `levels` the driver accepts.
    fn create_device(
        &self,
        driver: DriverKind<'_, AdapterOf<Self>>,
        levels: &[FeatureLevel],
    ) -> Result<CreatedDevice<Self::Device>, ProbeError>;
}

pub type AdapterOf<R> = <<R as DeviceRuntime>::Adapters as AdapterSource>::Adapter;

/// Lazy walk over the platform's adapters in enumeration order.
pub struct Adapters<'a, S: AdapterSource> {
    source: &'a S,
    next: u32,
    done: bool,
}

impl<S: AdapterSource> Iterator for Adapters<'_, S> {
    type Item = Result<(u32, S::Adapter), ProbeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.source.adapter(self.next) {
            Ok(Some(adapter)) => {
                let index = self.next;
                self.next += 1;
                Some(Ok((index, adapter)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Start a fresh enumeration. Each call re-queries the platform.
pub fn list_adapters<S: AdapterSource>(source: &S) -> Adapters<'_, S> {
    Adapters {
        source,
        next: 0,
        done: false,
    }
}

/// Result of probing one adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceOutcome {
    Created(DeviceReport),
    /// No device at all; `software` is `None` when the fallback was not tried.
    Failed {
        hardware: ProbeError,
        software: Option<ProbeError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    pub driver: DriverPath,
    /// Why the hardware attempt failed when `driver` is `Software`.
    pub hardware_error: Option<ProbeError>,
    pub level_code: u32,
    pub level_match: LevelMatch,
    /// Empty when the obtained level was not in the requested list.
    pub supported_levels: Vec<FeatureLevel>,
    pub device_adapter: Result<AdapterDescriptor, ProbeError>,
}

impl DeviceReport {
    /// The obtained level, if it is one that was requested.
    pub fn level(&self) -> Option<FeatureLevel> {
        match self.level_match {
            LevelMatch::Listed { level, .. } => Some(level),
            LevelMatch::Unlisted { .. } => None,
        }
    }
}

/// Probe one adapter. Every device created here is released before returning.
pub fn probe_adapter<R: DeviceRuntime>(
    runtime: &R,
    adapter: &AdapterOf<R>,
    settings: &ProbeSettings,
) -> DeviceOutcome {
    let levels = settings.requested_levels();

    let (created, driver, hardware_error) =
        match runtime.create_device(DriverKind::Hardware(adapter), levels) {
            Ok(created) => (created, DriverPath::Hardware, None),
            Err(hardware) => {
                warn!(error = %hardware, "hardware device creation failed");
                if !settings.software_fallback {
                    return DeviceOutcome::Failed {
                        hardware,
                        software: None,
                    };
                }
                match runtime.create_device(DriverKind::Software, levels) {
                    Ok(created) => {
                        info!("falling back to WARP software device");
                        (created, DriverPath::Software, Some(hardware))
                    }
                    Err(software) => {
                        warn!(error = %software, "WARP device creation failed");
                        return DeviceOutcome::Failed {
                            hardware,
                            software: Some(software),
                        };
                    }
                }
            }
        };

    let level_match = match_obtained(levels, created.level_code);
    let supported_levels = match level_match {
        LevelMatch::Listed { index, level } => {
            debug!(%level, index, "obtained feature level");
            implied_levels(levels, index).to_vec()
        }
        LevelMatch::Unlisted { code } => {
            warn!("obtained feature level 0x{code:x} was never requested");
            Vec::new()
        }
    };

    let device_adapter = created.device.adapter_descriptor();
    if let Err(err) = &device_adapter {
        warn!(error = %err, "adapter query through device failed");
    }

    DeviceOutcome::Created(DeviceReport {
        driver,
        hardware_error,
        level_code: created.level_code,
        level_match,
        supported_levels,
        device_adapter,
    })
}

/// Load the runtime, enumerate every adapter and probe each, writing the
/// report as it goes. Probe failures are reported, only I/O errors return.
pub fn run<R, L, W>(load: L, settings: &ProbeSettings, out: &mut W) -> io::Result<()>
where
    R: DeviceRuntime,
    L: FnOnce() -> Result<R, ProbeError>,
    W: Write + ?Sized,
{
    let runtime = match load() {
        Ok(runtime) => runtime,
        Err(err) => {
            warn!(error = %err, "D3D11 runtime unavailable");
            return report::write_runtime_missing(out);
        }
    };
    report::write_runtime_found(out)?;

    let source = match runtime.adapter_source() {
        Ok(source) => source,
        Err(err) => {
            warn!(error = %err, "adapter enumeration unavailable");
            return report::write_factory_failure(out, &err);
        }
    };

    for item in list_adapters(&source) {
        let (index, adapter) = match item {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "adapter enumeration stopped");
                report::write_enumeration_failure(out, &err)?;
                break;
            }
        };

        let descriptor = source.describe(&adapter);
        report::write_enumerated_adapter(out, index, &descriptor)?;

        let outcome = probe_adapter(&runtime, &adapter, settings);
        report::write_device_outcome(out, &outcome)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    const MIB: u64 = 1024 * 1024;
    const DEVICE_REMOVED: u32 = 0x887a0005;
    const UNSUPPORTED: u32 = 0x887a0004;
    const INVALID_CALL: u32 = 0x887a0001;

    #[derive(Clone)]
    struct FakeAdapter {
        name: String,
        descriptor: Result<AdapterDescriptor, ProbeError>,
        hardware: Result<u32, ProbeError>,
        device_adapter: Result<AdapterDescriptor, ProbeError>,
    }

    impl FakeAdapter {
        fn at_level(name: &str, level: FeatureLevel) -> Self {
            let descriptor = AdapterDescriptor {
                name: name.to_string(),
                vendor_id: 0x10de,
                device_id: 0x2684,
                dedicated_video_memory: 24 * 1024 * MIB,
                shared_system_memory: 16 * 1024 * MIB,
            };
            Self {
                name: name.to_string(),
                descriptor: Ok(descriptor.clone()),
                hardware: Ok(level.code()),
                device_adapter: Ok(descriptor),
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                hardware: Err(ProbeError::hresult("D3D11CreateDevice", UNSUPPORTED)),
                ..Self::at_level(name, FeatureLevel::Level9_1)
            }
        }
    }

    struct FakeSource {
        adapters: Vec<FakeAdapter>,
        fails_at: Option<u32>,
    }

    impl FakeSource {
        fn new(adapters: Vec<FakeAdapter>) -> Self {
            Self {
                adapters,
                fails_at: None,
            }
        }
    }

    impl AdapterSource for FakeSource {
        type Adapter = FakeAdapter;

        fn adapter(&self, index: u32) -> Result<Option<FakeAdapter>, ProbeError> {
            if self.fails_at == Some(index) {
                return Err(ProbeError::hresult("IDXGIFactory::EnumAdapters", INVALID_CALL));
            }
            Ok(self.adapters.get(index as usize).cloned())
        }

        fn describe(&self, adapter: &FakeAdapter) -> Result<AdapterDescriptor, ProbeError> {
            adapter.descriptor.clone()
        }
    }

    #[derive(Debug, PartialEq)]
    enum Attempt {
        Hardware(String),
        Software,
    }

    struct FakeDevice {
        adapter: Result<AdapterDescriptor, ProbeError>,
        live: Rc<Cell<i32>>,
    }

    impl ProbedDevice for FakeDevice {
        fn adapter_descriptor(&self) -> Result<AdapterDescriptor, ProbeError> {
            self.adapter.clone()
        }
    }

    impl Drop for FakeDevice {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    struct FakeRuntime {
        adapters: Vec<FakeAdapter>,
        software: Result<u32, ProbeError>,
        factory: Result<(), ProbeError>,
        enumeration_fails_at: Option<u32>,
        attempts: RefCell<Vec<Attempt>>,
        live: Rc<Cell<i32>>,
    }

    impl FakeRuntime {
        fn new(adapters: Vec<FakeAdapter>) -> Self {
            Self {
                adapters,
                software: Ok(FeatureLevel::Level11_1.code()),
                factory: Ok(()),
                enumeration_fails_at: None,
                attempts: RefCell::new(Vec::new()),
                live: Rc::new(Cell::new(0)),
            }
        }

        fn device(&self, adapter: Result<AdapterDescriptor, ProbeError>) -> FakeDevice {
            self.live.set(self.live.get() + 1);
            FakeDevice {
                adapter,
                live: Rc::clone(&self.live),
            }
        }
    }

    impl DeviceRuntime for &FakeRuntime {
        type Adapters = FakeSource;
        type Device = FakeDevice;

        fn adapter_source(&self) -> Result<FakeSource, ProbeError> {
            self.factory.clone()?;
            Ok(FakeSource {
                adapters: self.adapters.clone(),
                fails_at: self.enumeration_fails_at,
            })
        }

        fn create_device(
            &self,
            driver: DriverKind<'_, FakeAdapter>,
            levels: &[FeatureLevel],
        ) -> Result<CreatedDevice<FakeDevice>, ProbeError> {
            assert!(!levels.is_empty());
            match driver {
                DriverKind::Hardware(adapter) => {
                    self.attempts
                        .borrow_mut()
                        .push(Attempt::Hardware(adapter.name.clone()));
                    let level_code = adapter.hardware.clone()?;
                    Ok(CreatedDevice {
                        device: self.device(adapter.device_adapter.clone()),
                        level_code,
                    })
                }
                DriverKind::Software => {
                    self.attempts.borrow_mut().push(Attempt::Software);
                    let level_code = self.software.clone()?;
                    let warp = AdapterDescriptor {
                        name: "Microsoft Basic Render Driver".to_string(),
                        vendor_id: 0x1414,
                        device_id: 0x8c,
                        ..Default::default()
                    };
                    Ok(CreatedDevice {
                        device: self.device(Ok(warp)),
                        level_code,
                    })
                }
            }
        }
    }

    fn render(runtime: &FakeRuntime, settings: &ProbeSettings) -> String {
        let mut out = Vec::new();
        run(|| Ok::<_, ProbeError>(runtime), settings, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn listed_levels(output: &str) -> Vec<&str> {
        output
            .lines()
            .skip_while(|line| !line.starts_with("All supported feature levels"))
            .skip(1)
            .take_while(|line| line.starts_with("  "))
            .map(str::trim)
            .collect()
    }

    #[test]
    fn missing_runtime_skips_enumeration() {
        let mut out = Vec::new();
        run::<&FakeRuntime, _, _>(
            || {
                Err(ProbeError::LibraryMissing {
                    library: "d3d11.dll",
                    reason: "not found".to_string(),
                })
            },
            &ProbeSettings::default(),
            &mut out,
        )
        .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert_eq!(output, "DX11 runtime not present\n");
    }

    #[test]
    fn second_level_lists_itself_and_everything_below() {
        let runtime = FakeRuntime::new(vec![FakeAdapter::at_level(
            "GeForce RTX 4090",
            FeatureLevel::Level11_0,
        )]);
        let output = render(&runtime, &ProbeSettings::default());

        assert!(output.starts_with("DX11 runtime found\n"));
        assert!(output.contains("Adapter 0: GeForce RTX 4090"));
        assert!(output.contains("  VendorId: 4318, DeviceId: 9860"));
        assert!(output.contains("  Dedicated Video Memory: 24576 MB"));
        assert!(output.contains("  Shared System Memory: 16384 MB"));
        assert!(output.contains("Feature level: 11_0"));
        assert_eq!(
            listed_levels(&output),
            ["11_0", "10_1", "10_0", "9_3", "9_2", "9_1"]
        );
        assert!(!output.lines().any(|line| line.trim() == "11_1"));
        assert!(output.contains("Adapter: GeForce RTX 4090\nVideo memory: 24576 MB"));
        assert_eq!(*runtime.attempts.borrow(), [Attempt::Hardware("GeForce RTX 4090".into())]);
        assert_eq!(runtime.live.get(), 0);
    }

    #[test]
    fn hardware_failure_retries_warp_exactly_once() {
        let runtime = FakeRuntime::new(vec![FakeAdapter::failing("Broken GPU")]);
        let output = render(&runtime, &ProbeSettings::default());

        assert_eq!(
            *runtime.attempts.borrow(),
            [Attempt::Hardware("Broken GPU".into()), Attempt::Software]
        );
        assert!(output.contains("Failed to create DX11 device (hr=0x887a0004)\n"));
        assert!(output.contains("Using WARP software device"));
        assert!(output.contains("Feature level: 11_1"));
        assert!(output.contains("Adapter: Microsoft Basic Render Driver"));
        assert_eq!(runtime.live.get(), 0);
    }

    #[test]
    fn failing_adapter_does_not_stop_the_next_one() {
        let mut runtime = FakeRuntime::new(vec![
            FakeAdapter::failing("Broken GPU"),
            FakeAdapter::at_level("Arc A770", FeatureLevel::Level11_1),
        ]);
        runtime.software = Err(ProbeError::hresult("D3D11CreateDevice", DEVICE_REMOVED));
        let output = render(&runtime, &ProbeSettings::default());

        assert_eq!(
            *runtime.attempts.borrow(),
            [
                Attempt::Hardware("Broken GPU".into()),
                Attempt::Software,
                Attempt::Hardware("Arc A770".into()),
            ]
        );
        assert!(output.contains("Failed to create WARP software device"));
        assert!(output.contains("Adapter 1: Arc A770"));
        assert_eq!(listed_levels(&output).len(), FeatureLevel::DESCENDING.len());
        assert_eq!(output.matches("DX11 device created").count(), 1);
        assert_eq!(runtime.live.get(), 0);
    }

    #[test]
    fn disabled_fallback_gives_up_after_hardware() {
        let runtime = FakeRuntime::new(vec![FakeAdapter::failing("Broken GPU")]);
        let mut settings = ProbeSettings::default();
        settings.software_fallback = false;
        let output = render(&runtime, &settings);

        assert_eq!(*runtime.attempts.borrow(), [Attempt::Hardware("Broken GPU".into())]);
        assert!(!output.contains("WARP"));
        assert!(!output.contains("Feature level"));
    }

    #[test]
    fn unlisted_level_warns_and_omits_listing() {
        let mut adapter = FakeAdapter::at_level("Odd Driver", FeatureLevel::Level11_0);
        adapter.hardware = Ok(0xc100);
        let runtime = FakeRuntime::new(vec![adapter]);
        let output = render(&runtime, &ProbeSettings::default());

        assert!(output.contains("Feature level: Unknown"));
        assert!(output.contains("Warning: obtained feature level not found in requested levels"));
        assert!(listed_levels(&output).is_empty());
    }

    #[test]
    fn device_metadata_miss_keeps_the_probe() {
        let mut adapter = FakeAdapter::at_level("Quiet GPU", FeatureLevel::Level10_1);
        adapter.device_adapter = Err(ProbeError::hresult("IDXGIDevice::GetAdapter", 0x80004002_u32));
        let runtime = FakeRuntime::new(vec![adapter]);
        let output = render(&runtime, &ProbeSettings::default());

        assert!(output.contains("Feature level: 10_1"));
        assert!(output.contains("Adapter info unavailable via device"));
        assert!(!output.contains("Video memory:"));
        assert_eq!(runtime.live.get(), 0);
    }

    #[test]
    fn factory_failure_is_reported_once() {
        let mut runtime = FakeRuntime::new(vec![FakeAdapter::failing("never seen")]);
        runtime.factory = Err(ProbeError::hresult("CreateDXGIFactory1", 0x80004005_u32));
        let output = render(&runtime, &ProbeSettings::default());

        assert!(output.ends_with("Failed to create DXGI factory (hr=0x80004005)\n"));
        assert!(!output.contains("Adapter 0"));
        assert!(runtime.attempts.borrow().is_empty());
    }

    #[test]
    fn undescribed_adapter_is_still_probed() {
        let mut adapter = FakeAdapter::at_level("Blank GPU", FeatureLevel::Level10_0);
        adapter.descriptor = Err(ProbeError::hresult("IDXGIAdapter::GetDesc", INVALID_CALL));
        let runtime = FakeRuntime::new(vec![adapter]);
        let output = render(&runtime, &ProbeSettings::default());

        assert!(output.contains(
            "Adapter 0: <unknown>\n  \
             Description unavailable (IDXGIAdapter::GetDesc failed (hr=0x887a0001))\n"
        ));
        assert!(!output.contains("VendorId"));
        assert_eq!(*runtime.attempts.borrow(), [Attempt::Hardware("Blank GPU".into())]);
        assert!(output.contains("DX11 device created\nFeature level: 10_0"));
        assert!(output.contains("Adapter: Blank GPU"));
        assert_eq!(runtime.live.get(), 0);
    }

    #[test]
    fn enumeration_error_ends_the_walk() {
        let mut runtime = FakeRuntime::new(vec![
            FakeAdapter::at_level("First GPU", FeatureLevel::Level11_1),
            FakeAdapter::at_level("Second GPU", FeatureLevel::Level11_1),
            FakeAdapter::at_level("Third GPU", FeatureLevel::Level11_1),
        ]);
        runtime.enumeration_fails_at = Some(1);
        let output = render(&runtime, &ProbeSettings::default());

        assert_eq!(*runtime.attempts.borrow(), [Attempt::Hardware("First GPU".into())]);
        assert!(output.contains("Adapter 0: First GPU"));
        assert!(output.ends_with(
            "Adapter enumeration stopped (IDXGIFactory::EnumAdapters failed (hr=0x887a0001))\n"
        ));
        assert!(!output.contains("Second GPU"));
        assert!(!output.contains("Third GPU"));
        assert_eq!(runtime.live.get(), 0);
    }

    #[test]
    fn enumeration_error_is_yielded_once() {
        let mut source = FakeSource::new(vec![FakeAdapter::at_level("a", FeatureLevel::Level9_1)]);
        source.fails_at = Some(0);
        let mut adapters = list_adapters(&source);
        assert!(matches!(adapters.next(), Some(Err(_))));
        assert!(adapters.next().is_none());
    }

    #[test]
    fn empty_requested_list_falls_back_to_every_level() {
        let runtime = FakeRuntime::new(vec![FakeAdapter::at_level(
            "GeForce RTX 4090",
            FeatureLevel::Level11_0,
        )]);
        let settings = ProbeSettings::default().with_requested_levels([] as [FeatureLevel; 0]);
        let output = render(&runtime, &settings);

        assert!(output.contains("Feature level: 11_0"));
        assert!(!output.contains("Warning"));
        assert_eq!(
            listed_levels(&output),
            ["11_0", "10_1", "10_0", "9_3", "9_2", "9_1"]
        );
    }

    #[test]
    fn enumeration_visits_each_adapter_once() {
        let source = FakeSource::new(vec![
            FakeAdapter::at_level("a", FeatureLevel::Level9_1),
            FakeAdapter::at_level("b", FeatureLevel::Level9_1),
        ]);
        let indices: Vec<u32> = list_adapters(&source)
            .map(|item| item.map(|(index, _)| index).unwrap())
            .collect();
        assert_eq!(indices, [0, 1]);

        // A second walk re-queries from the start.
        assert_eq!(list_adapters(&source).count(), 2);
    }

    #[test]
    fn probed_level_is_always_requested() {
        let settings = ProbeSettings::default();
        for level in FeatureLevel::DESCENDING {
            let runtime = FakeRuntime::new(Vec::new());
            let adapter = FakeAdapter::at_level("gpu", level);
            let DeviceOutcome::Created(report) = probe_adapter(&&runtime, &adapter, &settings)
            else {
                panic!("device should be created");
            };
            assert_eq!(report.level(), Some(level));
            assert!(settings.requested_levels().contains(&level));
            assert_eq!(report.driver, DriverPath::Hardware);
        }
    }
}
