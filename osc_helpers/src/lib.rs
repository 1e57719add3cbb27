use log::{debug, info};
use osc_acquisition::{
    read_configuration, AcquisitionConfig, AcquisitionRequest, BufferIndexPlan,
};
use osc_traits::ScopeResult;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::Path;

/// Just a simple struct to hold the various bits needed to plan captures on a host.
pub struct ScopeContext {
    pub config: AcquisitionConfig,
}

impl ScopeContext {
    /// Plans one capture with the hardware described by the loaded configuration.
    pub fn plan_capture(
        &self,
        xsps: u64,
        ps_delay: i64,
        c_buff: u32,
    ) -> ScopeResult<BufferIndexPlan> {
        let request = AcquisitionRequest::from_config(&self.config, xsps, ps_delay, c_buff);
        BufferIndexPlan::plan(&request)
    }
}

/// This is a basic setup for a host side application or test to get you started.
///
/// config_path: RON file describing the acquisition hardware, see `osc_acquisition::config`.
///
/// text_log: if true, the log will be printed to the console.
/// Only the first logger installed in a process is kept.
pub fn basic_scope_setup(config_path: &Path, text_log: bool) -> ScopeResult<ScopeContext> {
    if text_log {
        let installed = TermLogger::init(
            LevelFilter::Debug,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        );
        if installed.is_err() {
            debug!("A logger is already installed, keeping it");
        }
    }

    let config = read_configuration(config_path)?;
    info!(
        "Acquisition config loaded from {:?}: ring of {} samples",
        config_path, config.dma.ring_len
    );
    Ok(ScopeContext { config })
}
