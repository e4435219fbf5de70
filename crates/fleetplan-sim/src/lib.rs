//! # Fleetplan Simulation
//!
//! 模擬介入：標記集合的切換與層級連動重算

pub mod markers;
pub mod simulator;

// Re-export 主要類型
pub use markers::{SimulatedIntervention, SimulationSet};
pub use simulator::InterventionSimulator;
