//! Per-cell absorption coefficients from species and soot loading

use super::table::{interp_k, interp_t, AbsorptionTable, TemperatureBin};
use crate::core_types::units::Kelvin;
use serde::{Deserialize, Serialize};

/// Scale applied to the local pressure in the gas contribution
pub const PRESSURE_SCALE: f64 = 100.0;

/// Scale applied to the soot contribution
pub const SOOT_SCALE: f64 = 100.0;

/// Absorbing species with a tabulated coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Co2,
    H2o,
    Co,
    Soot,
}

impl Species {
    /// Every tabulated species, in database order
    pub const ALL: [Species; 4] = [Species::Co2, Species::H2o, Species::Co, Species::Soot];

    /// Short lowercase name, as used in database file names
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Species::Co2 => "co2",
            Species::H2o => "h2o",
            Species::Co => "co",
            Species::Soot => "soot",
        }
    }
}

/// Gas state of one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasCellState {
    pub temperature: Kelvin,
    pub y_co2: f64,
    pub y_h2o: f64,
    pub y_co: f64,
    pub pressure: f64,
}

/// Absorption tables of every species
///
/// Immutable once built and shared read-only by every cell of every level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralDatabase {
    pub co2: AbsorptionTable,
    pub h2o: AbsorptionTable,
    pub co: AbsorptionTable,
    pub soot: AbsorptionTable,
}

impl SpectralDatabase {
    /// Table for one species
    #[must_use]
    pub fn table(&self, species: Species) -> &AbsorptionTable {
        match species {
            Species::Co2 => &self.co2,
            Species::H2o => &self.h2o,
            Species::Co => &self.co,
            Species::Soot => &self.soot,
        }
    }

    /// Gas absorption coefficient of one cell
    ///
    /// Mass-fraction weighted sum of the CO2, H2O and CO coefficients at the cell
    /// temperature, times the pressure scaled by [`PRESSURE_SCALE`].
    #[inline]
    #[must_use]
    pub fn gas_absorption(&self, cell: &GasCellState) -> f64 {
        let bin = interp_t(cell.temperature);
        self.gas_absorption_at(bin, cell.y_co2, cell.y_h2o, cell.y_co, cell.pressure)
    }

    /// Soot absorption contribution of one cell
    #[inline]
    #[must_use]
    pub fn soot_absorption(&self, temperature: Kelvin, soot_volume_fraction: f64) -> f64 {
        self.soot_absorption_at(interp_t(temperature), soot_volume_fraction)
    }

    #[inline]
    pub(crate) fn gas_absorption_at(
        &self,
        bin: TemperatureBin,
        y_co2: f64,
        y_h2o: f64,
        y_co: f64,
        pressure: f64,
    ) -> f64 {
        let kp_co2 = interp_k(bin, &self.co2);
        let kp_h2o = interp_k(bin, &self.h2o);
        let kp_co = interp_k(bin, &self.co);
        (y_co2 * kp_co2 + y_h2o * kp_h2o + y_co * kp_co) * (pressure * PRESSURE_SCALE)
    }

    #[inline]
    pub(crate) fn soot_absorption_at(&self, bin: TemperatureBin, soot_volume_fraction: f64) -> f64 {
        soot_volume_fraction * interp_k(bin, &self.soot) * SOOT_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn database() -> SpectralDatabase {
        SpectralDatabase {
            co2: AbsorptionTable::constant(2.0),
            h2o: AbsorptionTable::constant(3.0),
            co: AbsorptionTable::constant(5.0),
            soot: AbsorptionTable::constant(7.0),
        }
    }

    #[test]
    fn test_gas_absorption_combines_species() {
        let db = database();
        let cell = GasCellState {
            temperature: Kelvin::new(1200.0),
            y_co2: 0.1,
            y_h2o: 0.2,
            y_co: 0.05,
            pressure: 1.0,
        };
        // (0.2 + 0.6 + 0.25) * 100
        assert_relative_eq!(db.gas_absorption(&cell), 105.0, epsilon = 1e-10);
    }

    #[test]
    fn test_gas_absorption_scales_with_pressure() {
        let db = database();
        let mut cell = GasCellState {
            temperature: Kelvin::new(900.0),
            y_co2: 0.1,
            y_h2o: 0.0,
            y_co: 0.0,
            pressure: 1.0,
        };
        let base = db.gas_absorption(&cell);
        cell.pressure = 2.5;
        assert_relative_eq!(db.gas_absorption(&cell), 2.5 * base, epsilon = 1e-10);
    }

    #[test]
    fn test_soot_absorption() {
        let db = database();
        assert_relative_eq!(
            db.soot_absorption(Kelvin::new(1500.0), 1.0e-6),
            7.0e-4,
            epsilon = 1e-16
        );
        assert_eq!(db.soot_absorption(Kelvin::new(1500.0), 0.0), 0.0);
    }

    #[test]
    fn test_table_lookup_by_species() {
        let db = database();
        for species in Species::ALL {
            assert_eq!(db.table(species).samples().len(), 126);
        }
        assert_eq!(db.table(Species::Co).samples()[0], 5.0);
        assert_eq!(Species::H2o.name(), "h2o");
    }
}
