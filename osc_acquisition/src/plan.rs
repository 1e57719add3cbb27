//! Placement of the trigger and the point of interest (POI) in a capture.
//!
//! Given a requested rate and a trigger to POI delay, the planner fixes the
//! real sampling rate, converts the delay into samples, lays the trigger and
//! the POI out in the returned buffer and computes where the trigger must sit
//! in the DMA ring for the ring to be copied out contiguously.

use crate::config::AcquisitionConfig;
use crate::rotate::rotate;
use bincode::{Decode, Encode};
use log::{debug, warn};
use osc_clock::{picoseconds_from_samples, samples_from_picoseconds, TimerScaler, TimerSetting};
use osc_traits::{ScopeError, ScopeResult};
use serde::{Deserialize, Serialize};

/// Everything the planner needs to know about one capture.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionRequest {
    /// Requested rate in samples per second times `scale_sps`.
    pub xsps: u64,
    pub scale_sps: u32,
    pub interleave_threshold: u64,
    pub sample_timer: TimerScaler,
    pub delay_clock_hz: u32,
    /// Requested trigger to POI delay. Positive when the POI comes after the trigger.
    pub ps_delay: i64,
    /// Requested length of the returned buffer.
    pub c_buff: u32,
    pub c_dma_buff: u32,
    pub c_dma: u32,
    pub c_dma_slop: u32,
}

impl AcquisitionRequest {
    /// Combines the hardware description with the values of one capture.
    pub fn from_config(
        config: &AcquisitionConfig,
        xsps: u64,
        ps_delay: i64,
        c_buff: u32,
    ) -> Self {
        AcquisitionRequest {
            xsps,
            scale_sps: config.scale_sps,
            interleave_threshold: config.interleave_threshold,
            sample_timer: config.sample_timer,
            delay_clock_hz: config.delay_clock_hz,
            ps_delay,
            c_buff,
            c_dma_buff: config.dma.buffer_len,
            c_dma: config.dma.ring_len,
            c_dma_slop: config.dma.slop,
        }
    }

    fn validate(&self) -> ScopeResult<()> {
        if self.c_buff == 0 || self.c_dma_buff == 0 {
            return Err(ScopeError::InvalidRequest("empty return buffer"));
        }
        if self.c_dma == 0 {
            return Err(ScopeError::InvalidRequest("empty DMA ring"));
        }
        if self.scale_sps == 0 {
            return Err(ScopeError::InvalidRequest("zero rate scale"));
        }
        Ok(())
    }
}

/// Capture layout computed by [`BufferIndexPlan::plan`].
///
/// Built all at once: a plan either exists with every field consistent or
/// the planning call failed.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferIndexPlan {
    pub interleave: bool,
    /// Achieved rate, twice the timer rate when interleaving.
    pub xsps: u64,
    /// Sample timer registers, for one ADC when interleaving.
    pub timer: TimerSetting,
    /// Trigger to POI delay in samples.
    pub trig_to_poi: i64,
    /// Trigger to POI delay actually achievable at `xsps`.
    pub ps_delay: i64,
    /// Length of the returned buffer, clamped to the DMA buffer.
    pub c_buff: u32,
    /// Trigger index in the returned buffer, `None` if it falls before it.
    pub trigger: Option<u32>,
    /// POI index in the returned buffer, `None` if it falls before it.
    pub poi: Option<u32>,
    /// Where the trigger must be once the DMA ring is rotated.
    pub trig_dma: u32,
    /// Samples to capture before the trigger.
    pub before_trig: i64,
    /// Delay timer ticks from trigger to end of capture, at least 1.
    pub delay_ticks: i64,
}

impl BufferIndexPlan {
    /// Computes the capture layout for `request`.
    ///
    /// Fails with [`ScopeError::InvalidRequest`] on empty buffers or a zero rate
    /// scale, [`ScopeError::UnreachableRate`] when the sample timer cannot
    /// approach the rate, [`ScopeError::Overflow`] when the delay does not fit
    /// in 64 bits once converted, and [`ScopeError::TriggerMisaligned`] when
    /// the DMA ring cannot place the trigger where the returned buffer needs it.
    pub fn plan(request: &AcquisitionRequest) -> ScopeResult<Self> {
        request.validate()?;

        let interleave = request.xsps >= request.interleave_threshold;

        let (timer, xsps) = if interleave {
            let timer = request
                .sample_timer
                .scale(request.xsps.div_ceil(2), request.scale_sps);
            (timer, 2 * timer.xsps)
        } else {
            let timer = request.sample_timer.scale(request.xsps, request.scale_sps);
            (timer, timer.xsps)
        };

        if xsps == 0 {
            warn!("No capture plan for {} xsps", request.xsps);
            return Err(ScopeError::UnreachableRate { xsps: request.xsps });
        }

        let trig_to_poi = samples_from_picoseconds(request.ps_delay, xsps, request.scale_sps)?;
        let ps_delay = picoseconds_from_samples(trig_to_poi, xsps, request.scale_sps)?;
        let abs_trig_to_poi = trig_to_poi.unsigned_abs();

        let c_buff = request.c_buff.min(request.c_dma_buff) as i64;
        let c_dma = request.c_dma as i64;
        let half_slop = (request.c_dma_slop / 2) as i64;

        let (trigger, poi) = if abs_trig_to_poi < c_buff as u64 {
            // both fit, POI centered unless that pushes the trigger out
            let mut i_poi = c_buff / 2;
            let mut i_trg = i_poi - trig_to_poi;

            if i_trg < 0 {
                i_poi -= i_trg;
                i_trg = 0;
            } else if i_trg >= c_buff {
                let shift = i_trg - (c_buff - 1);
                i_trg -= shift;
                i_poi -= shift;
            }
            (Some(i_trg), Some(i_poi))
        } else if trig_to_poi > 0 {
            (None, Some(c_buff / 2))
        } else {
            (Some(c_buff - 1), None)
        };

        let abs_mod_dma = (abs_trig_to_poi % c_dma as u64) as i64;
        let trig_dma = match poi {
            None => c_buff - 1,
            Some(i_poi) if trig_to_poi > 0 => (i_poi + c_dma - abs_mod_dma) % c_dma,
            Some(i_poi) => (i_poi + abs_mod_dma) % c_dma,
        };

        if let Some(i_trg) = trigger {
            if i_trg != trig_dma {
                return Err(ScopeError::TriggerMisaligned {
                    trigger: i_trg as u32,
                    trig_dma: trig_dma as u32,
                });
            }
        }

        // an absent trigger counts as -1: only the half slop, less one, is taken
        let before_trig = trigger.unwrap_or(-1) + half_slop;

        let delay_xsps = request.delay_clock_hz as u64 * request.scale_sps as u64;
        let after_poi = c_buff - poi.unwrap_or(-1) + half_slop;
        let after_poi_ps = picoseconds_from_samples(after_poi, xsps, request.scale_sps)?;
        let delay_ticks = samples_from_picoseconds(ps_delay, delay_xsps, request.scale_sps)?
            + samples_from_picoseconds(after_poi_ps, delay_xsps, request.scale_sps)?;

        let plan = BufferIndexPlan {
            interleave,
            xsps,
            timer,
            trig_to_poi,
            ps_delay,
            c_buff: c_buff as u32,
            trigger: trigger.map(|t| t as u32),
            poi: poi.map(|p| p as u32),
            trig_dma: trig_dma as u32,
            before_trig,
            // the delay timer needs at least one tick
            delay_ticks: delay_ticks.max(1),
        };
        debug!("Capture plan: {:?}", plan);
        Ok(plan)
    }

    /// Rotates the DMA ring so that the trigger sample, found at
    /// `dma_trigger_index`, lands on [`trig_dma`](Self::trig_dma).
    /// `scratch` needs at least half the ring length.
    pub fn align_ring<T: Copy>(
        &self,
        ring: &mut [T],
        dma_trigger_index: usize,
        scratch: &mut [T],
    ) -> ScopeResult<()> {
        rotate(ring, self.trig_dma as usize, dma_trigger_index, scratch)
    }
}
