//! Simulation engine: steps a raw-signal source through an OHLCV series with
//! regime-aware sizing and adaptive stops.

pub mod simulation;

pub use simulation::{SignalSimulator, SimulationConfig};
