//! Absorption coefficients on the GPU
//!
//! Evaluates gas plus soot absorption for flat `f32` cell arrays with one compute
//! invocation per cell. Results match the CPU kernels to `f32` precision.

use super::context::GpuContext;
use crate::spectral::{GasSlices, Species, SpectralDatabase, NUM_SAMPLES};
use bytemuck::{Pod, Zeroable};
use tracing::debug;
use wgpu::util::DeviceExt;

const WORKGROUP_SIZE: u32 = 64;
const MAX_GROUPS_PER_DIM: u32 = 65_535;

/// Per-cell kernel input (must match the WGSL `Cell` layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuCell {
    pub temperature: f32,
    pub y_co2: f32,
    pub y_h2o: f32,
    pub y_co: f32,
    pub pressure: f32,
    pub soot_fv: f32,
}

/// Kernel parameters (must match the WGSL `Params` layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct KernelParams {
    n_cells: u32,
    row_stride: u32,
    _pad0: u32,
    _pad1: u32,
}

/// Pack gas and soot inputs into kernel cells
///
/// # Panics
///
/// Panics if the slices differ in length
#[must_use]
pub fn pack_cells(gas: &GasSlices<'_>, soot_fv: &[f64]) -> Vec<GpuCell> {
    let n = gas.temperature.len();
    assert!(
        [gas.y_co2, gas.y_h2o, gas.y_co, gas.pressure, soot_fv]
            .iter()
            .all(|s| s.len() == n),
        "Input arrays must match the output length"
    );
    (0..n)
        .map(|i| GpuCell {
            temperature: gas.temperature[i] as f32,
            y_co2: gas.y_co2[i] as f32,
            y_h2o: gas.y_h2o[i] as f32,
            y_co: gas.y_co[i] as f32,
            pressure: gas.pressure[i] as f32,
            soot_fv: soot_fv[i] as f32,
        })
        .collect()
}

/// Errors raised by a GPU absorption pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuKernelError {
    /// The device cannot hold buffers for this many cells
    TooManyCells(usize),
    /// Reading results back from the device failed
    Readback(String),
}

impl std::fmt::Display for GpuKernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuKernelError::TooManyCells(n) => {
                write!(f, "GPU cannot allocate absorption buffers for {n} cells")
            }
            GpuKernelError::Readback(e) => write!(f, "GPU readback failed: {e}"),
        }
    }
}

impl std::error::Error for GpuKernelError {}

/// Compiled absorption pipeline with the species tables resident on the device
pub struct GpuAbsorptionKernel<'a> {
    ctx: &'a GpuContext,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    tables: wgpu::Buffer,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl<'a> GpuAbsorptionKernel<'a> {
    /// Compile the kernel and upload the species tables
    #[must_use]
    pub fn new(ctx: &'a GpuContext, db: &SpectralDatabase) -> Self {
        let device = ctx.device();
        let shader = device.create_shader_module(wgpu::include_wgsl!("absorption.wgsl"));

        let mut packed: Vec<f32> = Vec::with_capacity(Species::ALL.len() * (NUM_SAMPLES + 1));
        for species in Species::ALL {
            let samples = db.table(species).samples();
            packed.extend(samples.iter().map(|&v| v as f32));
            packed.push(samples[NUM_SAMPLES - 1] as f32);
        }
        let tables = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Absorption Tables"),
            contents: bytemuck::cast_slice(&packed),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Absorption Bind Group Layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Absorption Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Absorption Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Self {
            ctx,
            pipeline,
            bind_group_layout,
            tables,
        }
    }

    /// Absorption coefficient (gas plus soot) of every cell
    ///
    /// # Errors
    ///
    /// Returns [`GpuKernelError::TooManyCells`] if the device cannot hold the
    /// buffers, or [`GpuKernelError::Readback`] if mapping the results fails
    pub fn evaluate(&self, cells: &[GpuCell]) -> Result<Vec<f32>, GpuKernelError> {
        if cells.is_empty() {
            return Ok(Vec::new());
        }
        let n_cells =
            u32::try_from(cells.len()).map_err(|_| GpuKernelError::TooManyCells(cells.len()))?;
        if !self.ctx.can_allocate(u64::from(n_cells)) {
            return Err(GpuKernelError::TooManyCells(cells.len()));
        }

        let device = self.ctx.device();
        let queue = self.ctx.queue();
        let groups = n_cells.div_ceil(WORKGROUP_SIZE);
        let groups_x = groups.min(MAX_GROUPS_PER_DIM);
        let groups_y = groups.div_ceil(groups_x);
        let params = KernelParams {
            n_cells,
            row_stride: groups_x * WORKGROUP_SIZE,
            _pad0: 0,
            _pad1: 0,
        };

        let input = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Absorption Cells"),
            contents: bytemuck::cast_slice(cells),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let output_size = u64::from(n_cells) * std::mem::size_of::<f32>() as u64;
        let output = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Absorption Output"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Absorption Staging"),
            size: output_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Absorption Params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Absorption Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.tables.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Absorption Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Absorption Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        encoder.copy_buffer_to_buffer(&output, 0, &staging, 0, output_size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| GpuKernelError::Readback(e.to_string()))?
            .map_err(|e| GpuKernelError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();

        debug!(
            "GPU absorption pass over {} cells ({} x {} workgroups)",
            n_cells, groups_x, groups_y
        );
        Ok(result)
    }
}
