//! CSV export of the optimized window series.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::runner::SignalRun;
use crate::series::HOURS_PER_DAY;

/// Column header for the window export.
const HEADER: &str = "hour,sample,price,pv_kwh,demand_kwh,net_demand_kwh,\
                      shifted_load_kwh,reallocation_kwh,signal";

/// Exports the window series of a run to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(run: &SignalRun, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(run, buf)
}

/// Writes the window series as CSV to any writer.
///
/// One row per hour of the window. `pv_kwh` is already scaled by the PV
/// capacity, so `net_demand_kwh = demand_kwh - pv_kwh`.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(run: &SignalRun, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    let w = &run.window;
    let shifted = run.shifted_load();
    let signal = run.signal.values();
    for h in 0..HOURS_PER_DAY {
        wtr.write_record(&[
            h.to_string(),
            (w.start + h).to_string(),
            format!("{:.4}", w.price[h]),
            format!("{:.4}", run.pv_size * w.pv[h]),
            format!("{:.4}", w.demand[h]),
            format!("{:.4}", w.net_demand[h]),
            format!("{:.4}", shifted[h]),
            format!("{:.4}", run.result.x[h]),
            format!("{:.6}", signal[h]),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
