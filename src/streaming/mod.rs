//! Streaming point-cloud parsing.
//!
//! This module provides the building blocks shared by every load:
//! - Chunked byte sources
//! - Line reassembly across chunk boundaries
//! - Header state machine and zero-allocation record parsing
//! - Progress accounting, cooperative yielding and cancellation
//!
//! Every load owns its own buffers, decoder state and progress counter.

pub mod buffers;
pub mod decoder;
pub mod header;
pub mod lines;
pub mod output;
pub mod parsing;
pub(crate) mod pipeline;
pub mod progress;
pub mod schedule;
pub mod source;

pub use decoder::{DecodeStats, Flow, RecordDecoder};
pub use header::{classify_header_line, HeaderLine, ParserState, RecordTarget};
pub use lines::{LineAssembler, Lines};
pub use output::PointWriter;
pub use parsing::{parse_color, parse_coord, parse_vertex_line, parse_xyz_line, FieldScanner};
pub use progress::{LoadProgress, Phase, Phasing, ProgressAccumulator};
pub use schedule::{yield_now, CancellationToken, YieldNow};
pub use source::{ByteSource, MemorySource, ReaderSource};
