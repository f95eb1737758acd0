//! Offloaded execution on a dedicated worker thread.
//!
//! The worker owns the source and every piece of parse state. The only
//! things crossing the thread boundary are the messages below and the
//! cancellation flag.

use crate::config::LoadConfig;
use crate::error::LoadError;
use crate::point::PointSet;
use crate::streaming::pipeline::{run_pipeline, Suspend};
use crate::streaming::progress::LoadProgress;
use crate::streaming::schedule::CancellationToken;
use crate::streaming::source::ByteSource;
use crossbeam_channel::{Receiver, TryRecvError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

/// Messages sent from the worker to the caller.
#[derive(Debug)]
pub enum WorkerMessage {
    Progress(LoadProgress),
    /// Terminal: the load failed.
    Error(LoadError),
    /// Terminal: the load succeeded.
    Complete(PointSet),
}

impl WorkerMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerMessage::Progress(_))
    }
}

/// Caller side of an offloaded load.
///
/// Each handle owns the cancellation token of its own load. The worker
/// thread is joined as soon as a terminal message has been received.
/// Dropping an unsettled handle cancels the load and detaches the worker,
/// which exits at its next chunk request or batch boundary.
pub struct LoadHandle {
    receiver: Receiver<WorkerMessage>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
    settled: bool,
}

pub(crate) fn spawn_worker<S>(
    source: S,
    config: LoadConfig,
    cancel: CancellationToken,
) -> Result<LoadHandle, LoadError>
where
    S: ByteSource + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded();
    let worker_cancel = cancel.clone();

    let thread = thread::Builder::new()
        .name("pointstream-worker".to_string())
        .spawn(move || {
            let progress_tx = tx.clone();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                pollster::block_on(run_pipeline(
                    source,
                    &config,
                    &worker_cancel,
                    Suspend::Never,
                    |p| {
                        // A closed channel means the caller is gone and has
                        // already requested cancellation.
                        let _ = progress_tx.send(WorkerMessage::Progress(p));
                    },
                ))
            }));
            let message = match outcome {
                Ok(Ok(points)) => WorkerMessage::Complete(points),
                Ok(Err(e)) => WorkerMessage::Error(e),
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    log::error!("load worker panicked: {}", reason);
                    WorkerMessage::Error(LoadError::WorkerFailure(reason))
                }
            };
            let _ = tx.send(message);
        })
        .map_err(|e| LoadError::WorkerFailure(format!("could not start worker thread: {}", e)))?;

    Ok(LoadHandle {
        receiver: rx,
        cancel,
        thread: Some(thread),
        settled: false,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

impl LoadHandle {
    /// Block until the next message.
    ///
    /// Returns `None` once a terminal message has been delivered.
    pub fn recv(&mut self) -> Option<WorkerMessage> {
        if self.settled {
            return None;
        }
        let message = match self.receiver.recv() {
            Ok(message) => message,
            Err(_) => disconnected(),
        };
        Some(self.observe(message))
    }

    /// Next message if one is ready, without blocking.
    ///
    /// Suited to host event loops that poll once per frame.
    pub fn try_recv(&mut self) -> Option<WorkerMessage> {
        if self.settled {
            return None;
        }
        let message = match self.receiver.try_recv() {
            Ok(message) => message,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => disconnected(),
        };
        Some(self.observe(message))
    }

    /// Block until the load settles, forwarding progress to `on_progress`.
    pub fn wait<F>(mut self, mut on_progress: F) -> Result<PointSet, LoadError>
    where
        F: FnMut(LoadProgress),
    {
        while let Some(message) = self.recv() {
            match message {
                WorkerMessage::Progress(p) => on_progress(p),
                WorkerMessage::Complete(points) => return Ok(points),
                WorkerMessage::Error(e) => return Err(e),
            }
        }
        Err(LoadError::WorkerFailure(
            "load already settled".to_string(),
        ))
    }

    /// Request cancellation. The worker settles with `Cancelled` at its
    /// next chunk request or batch boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// This load's cancellation token, for callers that cancel from
    /// elsewhere.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// True once a terminal message has been received.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    fn observe(&mut self, message: WorkerMessage) -> WorkerMessage {
        if message.is_terminal() {
            self.settled = true;
            self.teardown();
        }
        message
    }

    fn teardown(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("load worker exited abnormally");
            }
        }
    }
}

impl Drop for LoadHandle {
    fn drop(&mut self) {
        // A worker blocked inside a read cannot observe the flag until the
        // read returns, so it is not joined here.
        if self.thread.take().is_some() {
            self.cancel.cancel();
        }
    }
}

fn disconnected() -> WorkerMessage {
    WorkerMessage::Error(LoadError::WorkerFailure(
        "worker exited without a result".to_string(),
    ))
}
