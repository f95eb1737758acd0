//! Generate synthetic point clouds for benchmarking.
//!
//! This module provides the `pointstream generate` command to create
//! colored point clouds in either supported text format.
//!
//! Features:
//! - Cube (uniform volume) and sphere (uniform surface) shapes
//! - PLY ASCII or headerless XYZ output
//! - Deterministic reproducibility via seed

#![allow(clippy::manual_is_multiple_of)]

use crate::config::PointFormat;
use crate::error::LoadError;
use crate::point::Point;
use crate::streaming::output::PointWriter;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Buffer size for output (8MB for better throughput)
const BUF_SIZE: usize = 8 * 1024 * 1024;

/// Shape the generated points are sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Uniform inside an axis-aligned cube
    Cube,
    /// Uniform on the surface of a sphere
    Sphere,
}

impl Shape {
    /// Parse shape from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cube" | "box" => Some(Self::Cube),
            "sphere" | "ball" => Some(Self::Sphere),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Sphere => "sphere",
        }
    }
}

/// Size specification (parses 1K, 1M, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    pub count: u64,
}

impl SizeSpec {
    /// Parse size from string (e.g., "1K", "5M", "100").
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_uppercase();
        if s.is_empty() {
            return None;
        }

        let (num_part, multiplier) = if let Some(n) = s.strip_suffix('K') {
            (n, 1_000u64)
        } else if let Some(n) = s.strip_suffix('M') {
            (n, 1_000_000u64)
        } else if let Some(n) = s.strip_suffix('G') {
            (n, 1_000_000_000u64)
        } else {
            (s.as_str(), 1u64)
        };

        let n = num_part.parse::<u64>().ok()?;
        n.checked_mul(multiplier).map(|count| Self { count })
    }

    /// Format size for display.
    pub fn display(&self) -> String {
        format_count(self.count)
    }
}

/// Configuration for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub output: PathBuf,
    pub count: u64,
    pub format: PointFormat,
    pub shape: Shape,
    /// Half edge of the cube, or radius of the sphere.
    pub extent: f64,
    pub seed: u64,
    /// Random colors; when false every point is white.
    pub color: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("cloud.ply"),
            count: 1_000_000,
            format: PointFormat::HeaderQualified,
            shape: Shape::Cube,
            extent: 100.0,
            seed: 42,
            color: true,
        }
    }
}

/// Statistics from generate operation.
#[derive(Debug, Default, Clone)]
pub struct GenerateStats {
    pub total_points: u64,
    pub elapsed_secs: f64,
}

impl std::fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} points ({:.1}s)",
            format_count(self.total_points),
            self.elapsed_secs
        )
    }
}

/// Generate command.
pub struct GenerateCommand {
    config: GenerateConfig,
}

impl GenerateCommand {
    /// Create a new generate command with the given config.
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    /// Run the generation into the configured output file.
    pub fn run(&self) -> Result<GenerateStats, LoadError> {
        let start = Instant::now();
        let file = File::create(&self.config.output)?;

        eprintln!(
            "Generating {} {} points ({}) into {}",
            format_count(self.config.count),
            self.config.shape.name(),
            self.config.format.name(),
            self.config.output.display()
        );

        self.write_to(file)?;

        let stats = GenerateStats {
            total_points: self.config.count,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        eprintln!("Complete: {}", stats);
        Ok(stats)
    }

    /// Write the whole cloud to `output`.
    pub fn write_to<W: Write>(&self, output: W) -> Result<(), LoadError> {
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let mut writer = PointWriter::with_capacity(BUF_SIZE, output);

        match self.config.format {
            PointFormat::HeaderQualified => {
                writer.write_ply_header(self.config.count)?;
                for _ in 0..self.config.count {
                    let p = self.sample_point(&mut rng);
                    writer.write_point(&p)?;
                }
            }
            PointFormat::Headerless => {
                for _ in 0..self.config.count {
                    let p = self.sample_point(&mut rng);
                    if self.config.color {
                        writer.write_point(&p)?;
                    } else {
                        writer.write_position_line(&p)?;
                    }
                }
            }
        }

        writer.flush()
    }

    /// Sample a single point from the configured shape.
    fn sample_point(&self, rng: &mut SmallRng) -> Point {
        let [x, y, z] = match self.config.shape {
            Shape::Cube => {
                let e = self.config.extent;
                [
                    rng.gen_range(-e..=e),
                    rng.gen_range(-e..=e),
                    rng.gen_range(-e..=e),
                ]
            }
            Shape::Sphere => {
                let [dx, dy, dz] = unit_vector(rng);
                let r = self.config.extent;
                [dx * r, dy * r, dz * r]
            }
        };

        if self.config.color {
            Point::new(x, y, z, rng.gen(), rng.gen(), rng.gen())
        } else {
            Point::white(x, y, z)
        }
    }
}

/// Uniform random direction by rejection sampling inside the unit ball.
fn unit_vector(rng: &mut SmallRng) -> [f64; 3] {
    loop {
        let v: [f64; 3] = [
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        ];
        let len_sq = v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
        if len_sq > 1e-12 && len_sq <= 1.0 {
            let len = len_sq.sqrt();
            return [v[0] / len, v[1] / len, v[2] / len];
        }
    }
}

/// Format a count for display (e.g., 1000000 -> "1M").
fn format_count(count: u64) -> String {
    if count >= 1_000_000_000 && count % 1_000_000_000 == 0 {
        format!("{}G", count / 1_000_000_000)
    } else if count >= 1_000_000 && count % 1_000_000 == 0 {
        format!("{}M", count / 1_000_000)
    } else if count >= 1_000 && count % 1_000 == 0 {
        format!("{}K", count / 1_000)
    } else {
        count.to_string()
    }
}
