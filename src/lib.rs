// Clippy allows for the whole crate
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! pointstream: streaming point-cloud loader
//!
//! Loads colored point clouds from text streams without holding the raw
//! bytes in memory.
//!
//! # Features
//!
//! - **Two formats**: PLY ASCII with an `end_header` header, and headerless
//!   `x y z [r g b]` files
//! - **Chunked input**: lines are reassembled across arbitrary chunk
//!   boundaries
//! - **Two execution modes**: cooperative (yields to the host executor
//!   after every batch) or offloaded to a worker thread
//! - **Progress and cancellation**: monotonic percentage reporting with a
//!   cancellation token checked at every batch
//!
//! # Example
//!
//! ```rust,no_run
//! use pointstream::{MemorySource, LoadConfig, PointCloudLoader, PointFormat};
//!
//! let data = "ply\nelement vertex 1\nend_header\n1 2 3 255 0 0\n";
//! let loader = PointCloudLoader::new(LoadConfig::new(PointFormat::HeaderQualified));
//! let points = loader
//!     .load_blocking(MemorySource::new(data), |p| eprintln!("{:.0}%", p.percentage))
//!     .unwrap();
//! assert_eq!(points.len(), 1);
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod loader;
pub mod point;
pub mod streaming;

// Re-export commonly used types
pub use config::{ExecutionMode, LoadConfig, PointFormat};
pub use error::{LoadError, Result};
pub use loader::{detect_format, load_path, LoadHandle, PointCloudLoader, WorkerMessage};
pub use point::{Bounds, Point, PointSet};
pub use streaming::{
    ByteSource, CancellationToken, LoadProgress, MemorySource, ReaderSource,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{ExecutionMode, LoadConfig, PointFormat};
    pub use crate::error::LoadError;
    pub use crate::loader::{load_path, LoadHandle, PointCloudLoader, WorkerMessage};
    pub use crate::point::{Point, PointSet};
    pub use crate::streaming::{
        ByteSource, CancellationToken, LoadProgress, MemorySource, ReaderSource,
    };
}
