//! GPU absorption backend (`gpu` feature)
//!
//! Availability is probed at runtime through [`GpuContext::new`]; the CPU
//! kernels in [`crate::spectral`] remain the reference path.

mod absorption;
mod context;

pub use absorption::{pack_cells, GpuAbsorptionKernel, GpuCell, GpuKernelError};
pub use context::{GpuContext, GpuInitResult};
