//! Command implementations for the pointstream CLI.

pub mod generate;
pub mod load;

pub use generate::{GenerateCommand, GenerateConfig, GenerateStats, Shape, SizeSpec};
pub use load::{write_points, write_summary, LoadCommand, LoadStats};
