//! Simulation-side producers.

pub mod generator;

pub use generator::TrafficGenerator;
