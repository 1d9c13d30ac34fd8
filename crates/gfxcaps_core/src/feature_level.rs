//! Direct3D feature levels
//!
//! The requested list is always highest capability first; the device
//! creation call walks it in that order and returns the first level the
//! driver accepts.

use std::fmt;

/// A Direct3D capability tier, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureLevel {
    Level9_1,
    Level9_2,
    Level9_3,
    Level10_0,
    Level10_1,
    Level11_0,
    Level11_1,
}

impl FeatureLevel {
    /// Every known level, highest first.
    pub const DESCENDING: [FeatureLevel; 7] = [
        FeatureLevel::Level11_1,
        FeatureLevel::Level11_0,
        FeatureLevel::Level10_1,
        FeatureLevel::Level10_0,
        FeatureLevel::Level9_3,
        FeatureLevel::Level9_2,
        FeatureLevel::Level9_1,
    ];

    /// Platform code (`D3D_FEATURE_LEVEL_*`).
    pub const fn code(self) -> u32 {
        match self {
            FeatureLevel::Level9_1 => 0x9100,
            FeatureLevel::Level9_2 => 0x9200,
            FeatureLevel::Level9_3 => 0x9300,
            FeatureLevel::Level10_0 => 0xa000,
            FeatureLevel::Level10_1 => 0xa100,
            FeatureLevel::Level11_0 => 0xb000,
            FeatureLevel::Level11_1 => 0xb100,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::DESCENDING.into_iter().find(|level| level.code() == code)
    }

    pub const fn name(self) -> &'static str {
        match self {
            FeatureLevel::Level9_1 => "9_1",
            FeatureLevel::Level9_2 => "9_2",
            FeatureLevel::Level9_3 => "9_3",
            FeatureLevel::Level10_0 => "10_0",
            FeatureLevel::Level10_1 => "10_1",
            FeatureLevel::Level11_0 => "11_0",
            FeatureLevel::Level11_1 => "11_1",
        }
    }
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name for a raw code as returned by the platform.
pub fn code_name(code: u32) -> &'static str {
    FeatureLevel::from_code(code).map_or("Unknown", FeatureLevel::name)
}

/// Where the obtained level sits in the requested list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelMatch {
    /// Found at `index`; `level` is `requested[index]`.
    Listed { index: usize, level: FeatureLevel },
    /// The platform handed back a code that was never requested.
    Unlisted { code: u32 },
}

/// Linear scan of `requested` for the code the platform returned.
///
/// The creation call should only ever return a member of the list it was
/// given, but a mismatch is reported instead of assumed impossible.
pub fn match_obtained(requested: &[FeatureLevel], code: u32) -> LevelMatch {
    requested
        .iter()
        .position(|level| level.code() == code)
        .map_or(LevelMatch::Unlisted { code }, |index| LevelMatch::Listed {
            index,
            level: requested[index],
        })
}

/// Levels assumed supported once `requested[index]` was obtained: the
/// contiguous tail of the list from that index down to the lowest.
///
/// Obtaining level L does not strictly prove the driver accepts every lower
/// level; this is the tool's working assumption.
pub fn implied_levels(requested: &[FeatureLevel], index: usize) -> &[FeatureLevel] {
    requested.get(index..).unwrap_or(&[])
}
