//! GPU context and initialization
//!
//! Distinguishes "no GPU found" (expected on many hosts) from "GPU found but
//! failed to initialize" (worth a warning). Callers fall back to the CPU kernels
//! in both cases.

use tracing::{debug, info};

/// Result of a GPU initialization attempt
#[derive(Debug)]
pub enum GpuInitResult {
    /// GPU initialized successfully
    Success(GpuContext),
    /// No GPU adapter found
    NoGpuFound,
    /// GPU found but initialization failed
    InitFailed {
        /// Name of the adapter that failed
        adapter_name: String,
        /// Error message
        error: String,
    },
}

/// wgpu device and queue with adapter information
#[derive(Debug)]
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Try to create a compute device
    ///
    /// # Returns
    ///
    /// - `GpuInitResult::Success` - GPU ready to use
    /// - `GpuInitResult::NoGpuFound` - No compatible GPU adapter
    /// - `GpuInitResult::InitFailed` - GPU found but initialization failed
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> GpuInitResult {
        info!("Attempting to initialize GPU context");

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let Some(adapter) = pollster::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            },
        )) else {
            debug!("No GPU adapter found");
            return GpuInitResult::NoGpuFound;
        };

        let adapter_info = adapter.get_info();
        let adapter_name = adapter_info.name.clone();
        debug!("Found GPU adapter: {}", adapter_name);

        match pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("P1Rad GPU"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        )) {
            Ok((device, queue)) => {
                info!("GPU context initialized successfully: {}", adapter_name);
                GpuInitResult::Success(Self {
                    device,
                    queue,
                    adapter_info,
                })
            }
            Err(e) => {
                debug!("Failed to create GPU device: {}", e);
                GpuInitResult::InitFailed {
                    adapter_name,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Adapter name for logging
    #[must_use]
    pub fn adapter_name(&self) -> &str {
        &self.adapter_info.name
    }

    /// Check the device can hold the buffers of an absorption pass over `n_cells`
    ///
    /// Each cell needs six input and one output `f32` on the device plus one
    /// `f32` in the readback buffer.
    #[must_use]
    pub fn can_allocate(&self, n_cells: u64) -> bool {
        let limits = self.device.limits();
        let input_bytes = 6 * 4 * n_cells;
        let total_bytes = 8 * 4 * n_cells;
        input_bytes <= u64::from(limits.max_storage_buffer_binding_size)
            && total_bytes < limits.max_buffer_size / 2
    }

    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_init_returns_valid_result() {
        // Which variant comes back depends on the host
        match GpuContext::new() {
            GpuInitResult::Success(ctx) => {
                assert!(!ctx.adapter_name().is_empty());
                assert!(ctx.can_allocate(1024));
                assert!(!ctx.can_allocate(u64::MAX / 64));
            }
            GpuInitResult::NoGpuFound => {}
            GpuInitResult::InitFailed {
                adapter_name,
                error,
            } => {
                assert!(!adapter_name.is_empty());
                assert!(!error.is_empty());
            }
        }
    }
}
