use crate::error::{Error, Result};

use super::HourlySeries;

/// Samples per day window.
pub const HOURS_PER_DAY: usize = 24;

/// One day of index-aligned samples, ready for optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyWindow {
    /// Selected day index.
    pub day: usize,
    /// Index of the first sample in the full series.
    pub start: usize,
    pub net_demand: [f64; HOURS_PER_DAY],
    pub price: [f64; HOURS_PER_DAY],
    pub pv: [f64; HOURS_PER_DAY],
    pub demand: [f64; HOURS_PER_DAY],
}

impl DailyWindow {
    /// Extracts the window for `day` from the full series.
    ///
    /// The recording starts `start_hour_offset` hours into the first day, so
    /// the window covers `[24 * day - offset, 24 * day - offset + 24)`. With
    /// the default offset of 5 that is `[24d - 5, 24d + 19)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the window does not fit inside the
    /// series, and [`Error::LengthMismatch`] if `net_demand` is not aligned
    /// with `series`.
    pub fn select(
        series: &HourlySeries,
        net_demand: &[f64],
        day: usize,
        start_hour_offset: usize,
    ) -> Result<Self> {
        let len = series.len();
        if net_demand.len() != len {
            return Err(Error::LengthMismatch(format!(
                "net demand has {} samples, series has {len}",
                net_demand.len()
            )));
        }

        let out_of_range = || {
            let start = i64::try_from(day)
                .ok()
                .and_then(|d| d.checked_mul(HOURS_PER_DAY as i64))
                .map_or(i64::MAX, |h| h.saturating_sub(start_hour_offset as i64));
            Error::OutOfRange {
                day,
                start,
                end: start.saturating_add(HOURS_PER_DAY as i64),
                len,
            }
        };

        let start = day
            .checked_mul(HOURS_PER_DAY)
            .and_then(|h| h.checked_sub(start_hour_offset))
            .ok_or_else(out_of_range)?;
        let end = start
            .checked_add(HOURS_PER_DAY)
            .filter(|&end| end <= len)
            .ok_or_else(out_of_range)?;

        Ok(Self {
            day,
            start,
            net_demand: slice_array(&net_demand[start..end]),
            price: slice_array(&series.price()[start..end]),
            pv: slice_array(&series.pv()[start..end]),
            demand: slice_array(&series.demand()[start..end]),
        })
    }
}

fn slice_array(values: &[f64]) -> [f64; HOURS_PER_DAY] {
    let mut out = [0.0; HOURS_PER_DAY];
    out.copy_from_slice(values);
    out
}
