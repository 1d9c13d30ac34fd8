//! Display adapter metadata

const MIB: u64 = 1024 * 1024;

/// Snapshot of one adapter's description, taken once and printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterDescriptor {
    pub name: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub dedicated_video_memory: u64, // bytes
    pub shared_system_memory: u64,   // bytes
}

impl AdapterDescriptor {
    /// Decode a fixed-size UTF-16 description buffer, stopping at the first NUL.
    pub fn name_from_utf16(buffer: &[u16]) -> String {
        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        String::from_utf16_lossy(&buffer[..len])
    }

    pub fn dedicated_video_mb(&self) -> u64 {
        self.dedicated_video_memory / MIB
    }

    pub fn shared_system_mb(&self) -> u64 {
        self.shared_system_memory / MIB
    }
}
