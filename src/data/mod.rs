//! Input data module

pub mod generator;

pub use generator::generate_points;
