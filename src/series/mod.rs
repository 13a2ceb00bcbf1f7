//! Hourly input series and the transforms applied before optimization.

/// Net demand computation.
pub mod net_demand;
/// Day window extraction.
pub mod window;

pub use net_demand::net_demand;
pub use window::{DailyWindow, HOURS_PER_DAY};

use crate::error::{Error, Result};

/// Parallel hourly series over the whole observation period.
///
/// Sample `i` of every series refers to the same hour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    price: Vec<f64>,
    pv: Vec<f64>,
    demand: Vec<f64>,
}

impl HourlySeries {
    /// Bundles three equal-length series.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if the lengths differ.
    pub fn new(price: Vec<f64>, pv: Vec<f64>, demand: Vec<f64>) -> Result<Self> {
        if price.len() != pv.len() || price.len() != demand.len() {
            return Err(Error::LengthMismatch(format!(
                "price={}, pv={}, demand={}",
                price.len(),
                pv.len(),
                demand.len()
            )));
        }
        Ok(Self { price, pv, demand })
    }

    /// Price per kWh.
    pub fn price(&self) -> &[f64] {
        &self.price
    }

    /// PV production per unit of installed capacity (kWh).
    pub fn pv(&self) -> &[f64] {
        &self.pv
    }

    /// Building demand (kWh).
    pub fn demand(&self) -> &[f64] {
        &self.demand
    }

    pub fn len(&self) -> usize {
        self.price.len()
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_empty()
    }

    /// Net demand for the given PV capacity, see [`net_demand`].
    pub fn net_demand(&self, pv_size: f64) -> Vec<f64> {
        net_demand(&self.demand, &self.pv, pv_size)
    }
}
