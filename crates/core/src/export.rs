//! Multi-level diagnostic output
//!
//! [`ResultExporter`] packs the solution, the reference solution, their difference
//! and the operator inputs into one six-component field per level and hands it to a
//! [`PlotSink`]. The on-disk format belongs to the sink.

use crate::amr::{Geometry, IntVect, MultiFab};
use crate::config::AmrParams;
use crate::hierarchy::AmrHierarchy;
use tracing::info;

/// Component names of the assembled diagnostic field, in component order
pub const PLOT_VARIABLES: [&str; 6] = ["phi", "exact", "absolute error", "alpha", "beta", "rhs"];

/// Everything a multi-level writer needs for one plot
#[derive(Debug, Clone, Copy)]
pub struct PlotRequest<'a> {
    /// Output path
    pub path: &'a str,
    /// Component names
    pub var_names: &'a [&'a str],
    /// One field per level
    pub fields: &'a [MultiFab],
    /// One geometry per level
    pub geometries: &'a [Geometry],
    /// Simulation time of the plot
    pub time: f64,
    /// Step index of every level
    pub level_steps: &'a [u32],
    /// Refinement ratio of every level
    pub ref_ratios: &'a [IntVect],
}

impl PlotRequest<'_> {
    /// Number of levels in the plot
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.fields.len()
    }
}

/// External writer of multi-level plot data
pub trait PlotSink {
    /// Write one multi-level plot
    ///
    /// # Errors
    ///
    /// Returns any I/O failure of the underlying writer
    fn write_multi_level(&mut self, request: &PlotRequest<'_>) -> std::io::Result<()>;
}

/// Owned copy of a [`PlotRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPlot {
    pub path: String,
    pub var_names: Vec<String>,
    pub fields: Vec<MultiFab>,
    pub geometries: Vec<Geometry>,
    pub time: f64,
    pub level_steps: Vec<u32>,
    pub ref_ratios: Vec<IntVect>,
}

impl From<&PlotRequest<'_>> for RecordedPlot {
    fn from(request: &PlotRequest<'_>) -> Self {
        Self {
            path: request.path.to_string(),
            var_names: request.var_names.iter().map(|s| (*s).to_string()).collect(),
            fields: request.fields.to_vec(),
            geometries: request.geometries.to_vec(),
            time: request.time,
            level_steps: request.level_steps.to_vec(),
            ref_ratios: request.ref_ratios.to_vec(),
        }
    }
}

/// Sink that keeps every plot in memory
#[derive(Debug, Default)]
pub struct MemoryPlotSink {
    plots: Vec<RecordedPlot>,
}

impl MemoryPlotSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plots written so far, oldest first
    #[must_use]
    pub fn plots(&self) -> &[RecordedPlot] {
        &self.plots
    }

    /// Most recent plot
    #[must_use]
    pub fn last(&self) -> Option<&RecordedPlot> {
        self.plots.last()
    }
}

impl PlotSink for MemoryPlotSink {
    fn write_multi_level(&mut self, request: &PlotRequest<'_>) -> std::io::Result<()> {
        self.plots.push(RecordedPlot::from(request));
        Ok(())
    }
}

/// Per-level inputs of a diagnostic plot
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticFields<'a> {
    pub phi: &'a [MultiFab],
    pub phi_exact: &'a [MultiFab],
    pub acoef: &'a [MultiFab],
    pub bcoef: &'a [MultiFab],
    pub rhs: &'a [MultiFab],
}

impl DiagnosticFields<'_> {
    fn check_levels(&self, hierarchy: &AmrHierarchy) -> Result<(), ExportError> {
        let expected = hierarchy.num_levels();
        let named = [
            ("phi", self.phi),
            ("phi_exact", self.phi_exact),
            ("acoef", self.acoef),
            ("bcoef", self.bcoef),
            ("rhs", self.rhs),
        ];
        for (field, levels) in named {
            if levels.len() != expected {
                return Err(ExportError::FieldCountMismatch {
                    field,
                    expected,
                    found: levels.len(),
                });
            }
            for (level, mf) in levels.iter().enumerate() {
                if mf.box_array() != hierarchy.box_array(level)
                    || mf.distribution_map() != hierarchy.distribution_map(level)
                {
                    return Err(ExportError::FieldLayoutMismatch { field, level });
                }
            }
        }
        Ok(())
    }
}

/// Errors raised while exporting diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// A field does not have one entry per level
    FieldCountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    /// A field does not use its level's box array and distribution map
    FieldLayoutMismatch { field: &'static str, level: usize },
    /// The sink failed to write
    Sink(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::FieldCountMismatch {
                field,
                expected,
                found,
            } => write!(f, "{field} has {found} levels, expected {expected}"),
            ExportError::FieldLayoutMismatch { field, level } => {
                write!(f, "{field} on level {level} does not match the level layout")
            }
            ExportError::Sink(e) => write!(f, "plot sink failed: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Builds and emits the six-component diagnostic plot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultExporter {
    plot_file_name: String,
}

impl ResultExporter {
    /// Exporter writing to `plot_file_name`
    #[must_use]
    pub fn new(plot_file_name: impl Into<String>) -> Self {
        Self {
            plot_file_name: plot_file_name.into(),
        }
    }

    /// Exporter writing to the configured plot file
    #[must_use]
    pub fn from_params(params: &AmrParams) -> Self {
        Self::new(params.plot_file_name.clone())
    }

    /// Output path handed to the sink
    #[must_use]
    pub fn plot_file_name(&self) -> &str {
        &self.plot_file_name
    }

    /// Assemble one diagnostic field per level
    ///
    /// Components follow [`PLOT_VARIABLES`]. The error component is the computed
    /// solution minus the reference solution. Only valid cells are filled.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::FieldCountMismatch`] if any input does not have one
    /// entry per level of `hierarchy`, and [`ExportError::FieldLayoutMismatch`] if
    /// an entry is not defined on its level's box array and distribution map
    pub fn assemble(
        hierarchy: &AmrHierarchy,
        fields: &DiagnosticFields<'_>,
    ) -> Result<Vec<MultiFab>, ExportError> {
        fields.check_levels(hierarchy)?;

        Ok((0..hierarchy.num_levels())
            .map(|lev| {
                let mut plot = MultiFab::define(
                    hierarchy.box_array(lev),
                    hierarchy.distribution_map(lev),
                    PLOT_VARIABLES.len(),
                    0,
                );
                plot.copy_from(&fields.phi[lev], 0, 0, 1, 0);
                plot.copy_from(&fields.phi_exact[lev], 0, 1, 1, 0);
                plot.copy_from(&fields.phi[lev], 0, 2, 1, 0);
                plot.copy_from(&fields.acoef[lev], 0, 3, 1, 0);
                plot.copy_from(&fields.bcoef[lev], 0, 4, 1, 0);
                plot.copy_from(&fields.rhs[lev], 0, 5, 1, 0);
                plot.subtract(&fields.phi_exact[lev], 0, 2, 1, 0);
                plot
            })
            .collect())
    }

    /// Assemble the diagnostic fields and write them through `sink`
    ///
    /// Every level is written at time 0 and step 0, with the hierarchy's
    /// refinement ratio on every axis.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::FieldCountMismatch`] or
    /// [`ExportError::FieldLayoutMismatch`] for malformed inputs and
    /// [`ExportError::Sink`] if the sink fails
    pub fn write(
        &self,
        hierarchy: &AmrHierarchy,
        sink: &mut dyn PlotSink,
        fields: &DiagnosticFields<'_>,
    ) -> Result<(), ExportError> {
        let plot = Self::assemble(hierarchy, fields)?;
        let nlevels = hierarchy.num_levels();
        let ratio = hierarchy.ref_ratio();
        let level_steps = vec![0; nlevels];
        let ref_ratios = vec![IntVect::new(ratio, ratio, ratio); nlevels];

        let request = PlotRequest {
            path: &self.plot_file_name,
            var_names: &PLOT_VARIABLES,
            fields: &plot,
            geometries: hierarchy.geometries(),
            time: 0.0,
            level_steps: &level_steps,
            ref_ratios: &ref_ratios,
        };
        sink.write_multi_level(&request)
            .map_err(|e| ExportError::Sink(e.to_string()))?;

        info!(
            "Wrote diagnostic plot '{}' with {} levels",
            self.plot_file_name, nlevels
        );
        Ok(())
    }
}
