//! Demand-shaping signal for building occupants.
//!
//! Hourly price, PV, and demand data flow through a fixed pipeline:
//! [`io::loader`] → [`series`] (net demand, day window) → [`optimizer`]
//! → [`signal`]. [`runner`] wires the stages from a [`config::ScenarioConfig`].

pub mod config;
pub mod error;
pub mod io;
pub mod optimizer;
pub mod runner;
/// Hourly series, net demand, and day windows.
pub mod series;
pub mod signal;
pub mod summary;

pub use error::{Error, Result};
