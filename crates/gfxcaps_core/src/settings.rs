//! Probe settings

use crate::FeatureLevel;

/// Knobs shared by both probes. The binaries run with the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    requested_levels: Vec<FeatureLevel>,
    pub software_fallback: bool,
    pub gl_window_class: String,
    pub pixel_format: PixelFormatRequest,
}

/// Pixel format asked of the OpenGL device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatRequest {
    pub double_buffer: bool,
    pub color_bits: u8,
    pub depth_bits: u8,
}

impl Default for PixelFormatRequest {
    fn default() -> Self {
        Self {
            double_buffer: true,
            color_bits: 32,
            depth_bits: 24,
        }
    }
}

impl ProbeSettings {
    /// Replace the requested list. It is kept highest-first without duplicates.
    /// An empty list leaves the current one in place.
    pub fn with_requested_levels(mut self, levels: impl IntoIterator<Item = FeatureLevel>) -> Self {
        let mut levels: Vec<FeatureLevel> = levels.into_iter().collect();
        if levels.is_empty() {
            return self;
        }
        levels.sort_unstable_by(|a, b| b.cmp(a));
        levels.dedup();
        self.requested_levels = levels;
        self
    }

    pub fn requested_levels(&self) -> &[FeatureLevel] {
        &self.requested_levels
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            requested_levels: FeatureLevel::DESCENDING.to_vec(),
            software_fallback: true,
            gl_window_class: "DummyGL".to_string(),
            pixel_format: PixelFormatRequest::default(),
        }
    }
}
