//! Temperature-indexed absorption tables
//!
//! Every species table holds [`NUM_SAMPLES`] Planck-mean absorption coefficients
//! sampled every [`T_STEP`] K from [`T_MIN`] to [`T_MAX`]. Lookups split a
//! temperature into a lower bin and a fractional weight and blend the two
//! neighbouring samples linearly.

use crate::core_types::units::Kelvin;
use serde::{Deserialize, Serialize};

/// Samples per species table
pub const NUM_SAMPLES: usize = 126;

/// Temperature of the first sample (K)
pub const T_MIN: f64 = 300.0;

/// Temperature of the last sample (K)
pub const T_MAX: f64 = 2800.0;

/// Spacing between samples (K)
pub const T_STEP: f64 = 20.0;

/// Index of the last sample
pub const LAST_BIN: usize = NUM_SAMPLES - 1;

/// Lower bin index and interpolation weight for one temperature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureBin {
    /// Lower sample index, `0..=LAST_BIN`
    pub index: usize,
    /// Weight of the upper sample, `0.0..=1.0`
    pub weight: f64,
}

/// Map a temperature onto a table bin
///
/// Below [`T_MIN`] the lookup clamps to bin 0 with weight 0; above [`T_MAX`] it
/// clamps to the last bin with weight 1. Neither case is an error. A NaN
/// temperature clamps low.
#[inline]
#[must_use]
pub fn interp_t(t: Kelvin) -> TemperatureBin {
    let t = t.value();
    if t.is_nan() || t < T_MIN {
        return TemperatureBin {
            index: 0,
            weight: 0.0,
        };
    }
    if t > T_MAX {
        return TemperatureBin {
            index: LAST_BIN,
            weight: 1.0,
        };
    }

    let real = (t - T_MIN) / T_STEP;
    let lower = real.floor();
    TemperatureBin {
        index: lower as usize,
        weight: real - lower,
    }
}

/// Interpolate a table at a precomputed bin
#[inline]
#[must_use]
pub fn interp_k(bin: TemperatureBin, table: &AbsorptionTable) -> f64 {
    (1.0 - bin.weight) * table.samples[bin.index] + bin.weight * table.samples[bin.index + 1]
}

/// One species' absorption coefficients over the temperature grid
///
/// Storage carries one guard slot past the last sample holding a copy of it, so
/// the upper clamp (last bin, weight 1) reads the last sample instead of running
/// off the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct AbsorptionTable {
    samples: [f64; NUM_SAMPLES + 1],
}

impl AbsorptionTable {
    /// Build a table from exactly [`NUM_SAMPLES`] finite samples
    ///
    /// # Errors
    ///
    /// Returns [`SpectralError::WrongSampleCount`] or
    /// [`SpectralError::NonFiniteSample`]
    pub fn new(samples: &[f64]) -> Result<Self, SpectralError> {
        if samples.len() != NUM_SAMPLES {
            return Err(SpectralError::WrongSampleCount {
                expected: NUM_SAMPLES,
                found: samples.len(),
            });
        }
        if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
            return Err(SpectralError::NonFiniteSample { index });
        }

        let mut storage = [0.0; NUM_SAMPLES + 1];
        storage[..NUM_SAMPLES].copy_from_slice(samples);
        storage[NUM_SAMPLES] = samples[LAST_BIN];
        Ok(Self { samples: storage })
    }

    /// Build a table from `(temperature, coefficient)` rows
    ///
    /// Rows must sit exactly on the sample grid, in order. This is the layout of
    /// the two-column database files the tables are usually read from.
    ///
    /// # Errors
    ///
    /// Returns [`SpectralError::TemperatureGridMismatch`] for a row off the grid,
    /// or any error [`AbsorptionTable::new`] returns
    pub fn from_pairs(rows: &[(f64, f64)]) -> Result<Self, SpectralError> {
        for (index, &(t, _)) in rows.iter().enumerate() {
            let expected = T_MIN + T_STEP * index as f64;
            if (t - expected).abs() > 1.0e-6 {
                return Err(SpectralError::TemperatureGridMismatch {
                    index,
                    expected,
                    found: t,
                });
            }
        }
        let samples: Vec<f64> = rows.iter().map(|&(_, k)| k).collect();
        Self::new(&samples)
    }

    /// Table with every sample equal to `value`
    ///
    /// # Panics
    ///
    /// Panics if `value` is not finite
    #[must_use]
    pub fn constant(value: f64) -> Self {
        assert!(value.is_finite(), "Absorption sample must be finite");
        Self {
            samples: [value; NUM_SAMPLES + 1],
        }
    }

    /// The [`NUM_SAMPLES`] tabulated samples, without the guard slot
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples[..NUM_SAMPLES]
    }

    /// Interpolated coefficient at `t`
    #[inline]
    #[must_use]
    pub fn at(&self, t: Kelvin) -> f64 {
        interp_k(interp_t(t), self)
    }

    /// Temperature of sample `index`
    #[must_use]
    pub fn temperature_of(index: usize) -> Kelvin {
        Kelvin::new(T_MIN + T_STEP * index as f64)
    }
}

impl TryFrom<Vec<f64>> for AbsorptionTable {
    type Error = SpectralError;

    fn try_from(samples: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(&samples)
    }
}

impl From<AbsorptionTable> for Vec<f64> {
    fn from(table: AbsorptionTable) -> Self {
        table.samples().to_vec()
    }
}

/// Errors raised while building absorption tables
#[derive(Debug, Clone, PartialEq)]
pub enum SpectralError {
    /// Sample slice has the wrong length
    WrongSampleCount { expected: usize, found: usize },
    /// A sample is NaN or infinite
    NonFiniteSample { index: usize },
    /// A table row is not on the 20 K temperature grid
    TemperatureGridMismatch {
        index: usize,
        expected: f64,
        found: f64,
    },
}

impl std::fmt::Display for SpectralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpectralError::WrongSampleCount { expected, found } => {
                write!(f, "Absorption table needs {expected} samples, got {found}")
            }
            SpectralError::NonFiniteSample { index } => {
                write!(f, "Absorption sample {index} is not finite")
            }
            SpectralError::TemperatureGridMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "Absorption table row {index} is at {found} K, expected {expected} K"
            ),
        }
    }
}

impl std::error::Error for SpectralError {}
