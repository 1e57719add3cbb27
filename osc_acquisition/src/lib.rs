//! Acquisition side of the scope core: static hardware configuration, capture
//! window planning and DMA ring alignment.
//!
//! This crate only computes indices and rotations, programming the timers and
//! running the DMA transfers is left to the acquisition engine.

pub mod config;
pub mod plan;
pub mod rotate;

pub use config::{read_configuration, AcquisitionConfig, DmaGeometry};
pub use plan::{AcquisitionRequest, BufferIndexPlan};
pub use rotate::rotate;
