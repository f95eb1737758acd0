//! The load pipeline: chunks in, points out.
//!
//! Cooperative loads await this future on the caller's executor; the
//! offloaded worker drives the very same future on its own thread.

use crate::config::{LoadConfig, PointFormat};
use crate::error::LoadError;
use crate::point::PointSet;
use crate::streaming::buffers::MAX_PREALLOCATED_POINTS;
use crate::streaming::decoder::{Flow, RecordDecoder};
use crate::streaming::header::RecordTarget;
use crate::streaming::lines::LineAssembler;
use crate::streaming::progress::{LoadProgress, Phase, Phasing, ProgressAccumulator};
use crate::streaming::schedule::{yield_now, CancellationToken};
use crate::streaming::source::ByteSource;
use std::time::Instant;

/// Whether the pipeline suspends at batch boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Suspend {
    AtBatches,
    Never,
}

fn phasing(format: PointFormat) -> Phasing {
    match format {
        PointFormat::HeaderQualified => Phasing::HeaderThenBody,
        PointFormat::Headerless => Phasing::BytesOnly,
    }
}

fn phase(decoder: &RecordDecoder) -> Phase {
    match decoder.target() {
        Some(target) => Phase::Body(target),
        None => Phase::Header,
    }
}

/// Run one load to completion.
///
/// Progress is reported after every `config.batch_size` decoded records
/// and once more, at exactly 100, before a successful return. Nothing is
/// returned on failure.
pub(crate) async fn run_pipeline<S, F>(
    mut source: S,
    config: &LoadConfig,
    cancel: &CancellationToken,
    suspend: Suspend,
    mut on_progress: F,
) -> Result<PointSet, LoadError>
where
    S: ByteSource,
    F: FnMut(LoadProgress),
{
    let started = Instant::now();
    let batch = config.batch_size.max(1) as u64;
    let mut decoder = RecordDecoder::new(config.format);
    let mut progress = ProgressAccumulator::new(phasing(config.format), source.total_len());
    let mut assembler = LineAssembler::new();
    let mut points = PointSet::new();
    let mut bytes_loaded: u64 = 0;
    let mut next_boundary = batch;
    let mut reserved = false;

    'stream: loop {
        cancel.check()?;
        let chunk = match source.next_chunk().await? {
            Some(chunk) => chunk,
            None => break,
        };
        bytes_loaded += chunk.len() as u64;

        let mut lines = assembler.feed(chunk);
        while let Some(line) = lines.next_line() {
            if decoder.decode_line(line, &mut points) == Flow::Done {
                break 'stream;
            }
            if !reserved {
                if let Some(target) = decoder.target() {
                    if let RecordTarget::Declared(n) = target {
                        let n = usize::try_from(n).unwrap_or(usize::MAX);
                        points.reserve(n.min(MAX_PREALLOCATED_POINTS));
                    }
                    reserved = true;
                }
            }
            if decoder.decoded() >= next_boundary {
                next_boundary += batch;
                let snapshot = progress.observe(bytes_loaded, decoder.decoded(), phase(&decoder));
                log::trace!(
                    "batch boundary: {} records, {:.1}%",
                    snapshot.records_processed,
                    snapshot.percentage
                );
                on_progress(snapshot);
                cancel.check()?;
                if suspend == Suspend::AtBatches {
                    yield_now().await;
                }
            }
        }
    }

    if !decoder.state().is_terminal() {
        // The last line of a file usually has no trailing newline.
        if let Some(tail) = assembler.flush() {
            decoder.decode_line(tail, &mut points);
        }
    }
    decoder.finish()?;

    let stats = decoder.stats();
    log::info!(
        "loaded {} points ({} skipped lines, {} bytes) in {:.2?}",
        stats.decoded,
        stats.skipped,
        bytes_loaded,
        started.elapsed()
    );
    on_progress(progress.finish(bytes_loaded, decoder.decoded(), phase(&decoder)));
    Ok(points)
}
