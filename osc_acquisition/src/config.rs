//! This module defines the static configuration of the acquisition hardware.
//! The configuration is serialized in the RON format, for example:
//! ```ron
//! (
//!     sample_timer: (pb_clk: 100000000, max_period: 65535, min_sps: 6),
//!     delay_clock_hz: 100000000,
//!     interleave_threshold: 50000000000,
//!     dma: (buffer_len: 32768, ring_len: 32768, slop: 20),
//!     scale_sps: 1000,
//! )
//! ```
//! `dma` and `scale_sps` may be omitted. Every rate, the interleave threshold
//! included, is in samples per second times `scale_sps`.

use osc_clock::{TimerScaler, DEFAULT_SCALE_SPS};
use osc_traits::{ScopeError, ScopeResult};
use ron::extensions::Extensions;
use ron::Options;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

pub const DEFAULT_PB_CLK: u32 = 100_000_000;

/// 50MS/s, in milli-samples per second.
pub const DEFAULT_INTERLEAVE_THRESHOLD: u64 = 50_000_000 * DEFAULT_SCALE_SPS as u64;

/// Sizes of the DMA capture ring and of the buffer handed back to the caller, in samples.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaGeometry {
    /// Largest buffer that can be returned (cDMABuff).
    pub buffer_len: u32,
    /// Length of the DMA ring (cDMA).
    pub ring_len: u32,
    /// Extra samples taken around the trigger (cDMASlop).
    pub slop: u32,
}

impl Default for DmaGeometry {
    fn default() -> Self {
        DmaGeometry {
            buffer_len: 32_768,
            ring_len: 32_768,
            slop: 20,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    pub sample_timer: TimerScaler,
    /// Peripheral clock of the trigger delay timer.
    pub delay_clock_hz: u32,
    /// Rates at or above this one, in xsps, are captured by two interleaved ADCs.
    pub interleave_threshold: u64,
    #[serde(default)]
    pub dma: DmaGeometry,
    #[serde(default = "default_scale_sps")]
    pub scale_sps: u32,
}

fn default_scale_sps() -> u32 {
    DEFAULT_SCALE_SPS
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        AcquisitionConfig {
            sample_timer: TimerScaler::new(DEFAULT_PB_CLK),
            delay_clock_hz: DEFAULT_PB_CLK,
            interleave_threshold: DEFAULT_INTERLEAVE_THRESHOLD,
            dma: DmaGeometry::default(),
            scale_sps: DEFAULT_SCALE_SPS,
        }
    }
}

impl AcquisitionConfig {
    fn get_options() -> Options {
        Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .with_default_extension(Extensions::UNWRAP_NEWTYPES)
    }

    pub fn serialize_ron(&self) -> ScopeResult<String> {
        let pretty = ron::ser::PrettyConfig::default();
        Self::get_options()
            .to_string_pretty(self, pretty)
            .map_err(|e| ScopeError::Config(e.to_string()))
    }

    pub fn deserialize_ron(ron: &str) -> ScopeResult<Self> {
        Self::get_options()
            .from_str(ron)
            .map_err(|e| ScopeError::Config(format!("Syntax Error in config: {}", e)))
    }
}

/// Read an acquisition configuration from a file.
pub fn read_configuration(config_filename: &Path) -> ScopeResult<AcquisitionConfig> {
    let config_content = read_to_string(config_filename).map_err(|e| {
        ScopeError::Config(format!(
            "Failed to read configuration file {:?}: {}",
            config_filename, e
        ))
    })?;
    AcquisitionConfig::deserialize_ron(&config_content)
}
