use thiserror::Error;

/// Common error type of the scope acquisition core.
///
/// Everything except `Config` is produced on the computation path and
/// carries only plain integers so that building an error never allocates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Result buffer of {available} bytes cannot hold a {needed} bytes product")]
    Overflow { needed: usize, available: usize },

    #[error("Division by zero")]
    DivideByZero,

    #[error("Divisor magnitude {divisor} is too large for the long division path (max 2^56)")]
    DivisorTooLarge { divisor: u64 },

    #[error("Operand of {width} bytes exceeds the {max} bytes scratch arena")]
    OperandTooWide { width: usize, max: usize },

    #[error("No prescalar and period combination can reach {xsps} xsps")]
    UnreachableRate { xsps: u64 },

    #[error("Ring buffer length {len} is not a multiple of 2")]
    OddBufferLength { len: usize },

    #[error("Scratch buffer of {available} elements is smaller than the {needed} required")]
    ScratchTooSmall { needed: usize, available: usize },

    #[error("Index {index} is out of range for a buffer of {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Trigger index {trigger} does not match the DMA rotation target {trig_dma}")]
    TriggerMisaligned { trigger: u32, trig_dma: u32 },

    #[error("Invalid acquisition request: {0}")]
    InvalidRequest(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

// Generic Result type for the scope core.
pub type ScopeResult<T> = Result<T, ScopeError>;
