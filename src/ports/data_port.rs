//! Price data access port trait.

use crate::domain::bar::PriceSeries;
use crate::domain::error::FractalShiftError;

/// Source of validated price series. Implementations must reject malformed
/// bars before handing a series to the engine.
pub trait DataPort {
    fn load_series(&self, symbol: &str) -> Result<PriceSeries, FractalShiftError>;
}
