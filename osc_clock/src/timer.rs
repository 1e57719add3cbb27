//! Sample timer prescalar and period search.

use bincode::{Decode, Encode};
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// 16-bit period register.
pub const DEFAULT_MAX_PERIOD: u32 = 0xFFFF;

/// Below this many samples per second a ÷256 prescaled 16-bit timer overflows
/// and an outer software count is needed.
pub const DEFAULT_MIN_SPS: u64 = 6;

/// Hardware prescalar code of the sample timer.
///
/// Codes 0 to 7 divide the peripheral clock by 1, 2, 4, 8, 16, 32, 64 and 256.
/// There is no ÷128.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
pub struct Prescalar(u8);

impl Prescalar {
    pub const MAX_CODE: u8 = 7;
    pub const DIV_1: Prescalar = Prescalar(0);
    pub const DIV_256: Prescalar = Prescalar(7);

    pub fn from_code(code: u8) -> Option<Self> {
        (code <= Self::MAX_CODE).then_some(Prescalar(code))
    }

    #[inline]
    pub fn code(self) -> u8 {
        self.0
    }

    pub fn divisor(self) -> u32 {
        if self.0 == Self::MAX_CODE {
            256
        } else {
            1 << self.0
        }
    }
}

impl Display for Prescalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "1:{}", self.divisor())
    }
}

/// Register values programming the sample timer, and the rate they actually produce.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TimerSetting {
    /// Achieved rate in xsps, 0 if the requested rate cannot be reached.
    pub xsps: u64,
    pub prescalar: Prescalar,
    /// Timer ticks per sample, after the prescalar.
    pub period: u32,
    /// Software count of timer periods per sample, 1 unless very slow.
    pub count: u32,
}

impl TimerSetting {
    fn unreachable() -> Self {
        TimerSetting {
            xsps: 0,
            prescalar: Prescalar::DIV_1,
            period: 1,
            count: 1,
        }
    }

    #[inline]
    pub fn is_reachable(&self) -> bool {
        self.xsps != 0
    }

    /// Value to load in the period register, which counts from 0.
    #[inline]
    pub fn period_register(&self) -> u32 {
        self.period.saturating_sub(1)
    }
}

/// Searches the prescalar, period and outer count approximating a sample rate
/// on a timer fed by a `pb_clk` Hz peripheral clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerScaler {
    pub pb_clk: u32,
    #[serde(default = "default_max_period")]
    pub max_period: u32,
    #[serde(default = "default_min_sps")]
    pub min_sps: u64,
}

fn default_max_period() -> u32 {
    DEFAULT_MAX_PERIOD
}

fn default_min_sps() -> u64 {
    DEFAULT_MIN_SPS
}

impl TimerScaler {
    pub const fn new(pb_clk: u32) -> Self {
        TimerScaler {
            pb_clk,
            max_period: DEFAULT_MAX_PERIOD,
            min_sps: DEFAULT_MIN_SPS,
        }
    }

    pub const fn with_max_period(mut self, max_period: u32) -> Self {
        self.max_period = max_period;
        self
    }

    pub const fn with_min_sps(mut self, min_sps: u64) -> Self {
        self.min_sps = min_sps;
        self
    }

    /// Finds the timer setting closest to `xsps / scale_sps` samples per second.
    ///
    /// Fast rates try each prescalar from ÷1 upward and keep the first one whose
    /// rounded period fits the period register. Rates below `min_sps` use the
    /// ÷256 prescalar and split the period with an outer count.
    ///
    /// The returned rate is recomputed from the rounded registers, it is what
    /// the hardware will deliver. It is 0, with a period of 1 and a ÷1
    /// prescalar, when no setting fits.
    pub fn scale(&self, xsps: u64, scale_sps: u32) -> TimerSetting {
        let max_period = self.max_period as u64;
        if xsps == 0 || max_period == 0 {
            warn!("Sample timer cannot run at {} xsps", xsps);
            return TimerSetting::unreachable();
        }

        let pb_x_scale = self.pb_clk as u64 * scale_sps as u64;
        let Some(rounded) = pb_x_scale.checked_add(xsps / 2) else {
            warn!("Sample timer cannot run at {} xsps", xsps);
            return TimerSetting::unreachable();
        };
        let mut tmr = rounded / xsps;
        let mut code: u8 = 0;
        let mut pre_divide: u64 = 1;
        let mut count: u64 = 1;

        if xsps < self.min_sps.saturating_mul(scale_sps as u64) {
            tmr = (tmr + 128) / 256;
            count = tmr.div_ceil(max_period).max(1);
            tmr = (tmr + count / 2) / count;

            code = Prescalar::DIV_256.code();
            pre_divide = 256;
        } else {
            // 9 means nothing fits, 8 is a ÷256 reached by doubling past the missing ÷128
            while code < 9 {
                let candidate = (tmr + pre_divide / 2) / pre_divide;
                if candidate <= max_period {
                    tmr = candidate;
                    break;
                }
                pre_divide *= 2;
                code += 1;
            }

            if code == 8 {
                code = Prescalar::DIV_256.code();
            } else if code == 7 {
                tmr = (tmr + 1) / 2;
                pre_divide *= 2;
            }

            if code == 9 {
                warn!("Sample timer period overflows at {} xsps", xsps);
                return TimerSetting::unreachable();
            }
        }

        if tmr == 0 {
            warn!("Sample timer is too slow for {} xsps", xsps);
            return TimerSetting::unreachable();
        }

        // the prescalar division is exact for the peripheral clocks in use
        let ticks = count * tmr;
        let achieved = (pb_x_scale / pre_divide + ticks / 2) / ticks;

        let setting = TimerSetting {
            xsps: achieved,
            prescalar: Prescalar(code),
            period: tmr as u32,
            count: count as u32,
        };
        trace!(
            "Sample timer: {} xsps requested, {} achieved with {} period {} count {}",
            xsps,
            achieved,
            setting.prescalar,
            setting.period,
            setting.count
        );
        setting
    }
}
