//! One-at-a-time stage execution for interactive triggers.
//!
//! A [`StageRunner`] owns a single detached worker thread fed by a
//! capacity-1 channel. A trigger that fires while a stage is queued or
//! running is dropped (`enqueue` returns `false`) rather than queued behind
//! it. Every accepted request produces exactly one [`StageCompletion`], and
//! the busy flag is cleared before the completion callback runs, so the
//! callback may enqueue the next stage.

use crate::stage::{StageError, StageId, StageReport, StageRequest};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::thread;

/// Outcome delivered to the completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCompletion {
    pub stage: StageId,
    pub success: bool,
    pub message: String,
}

impl StageCompletion {
    pub fn from_result(stage: StageId, result: &Result<StageReport, StageError>) -> Self {
        match result {
            Ok(report) => Self {
                stage,
                success: true,
                message: report.summary(),
            },
            Err(e @ StageError::EmptyInput(_)) => Self {
                stage,
                success: false,
                message: format!("{stage}: no work done ({e})"),
            },
            Err(e) => Self {
                stage,
                success: false,
                message: format!("{stage} failed: {e}"),
            },
        }
    }
}

pub struct StageRunner {
    tx: SyncSender<StageRequest>,
    busy: Arc<AtomicBool>,
}

impl StageRunner {
    /// Start the worker thread.
    pub fn spawn<E, C>(executor: E, on_complete: C) -> io::Result<Self>
    where
        E: Fn(&StageRequest) -> Result<StageReport, StageError> + Send + 'static,
        C: Fn(StageCompletion) + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<StageRequest>(1);
        let busy = Arc::new(AtomicBool::new(false));
        let worker_busy = Arc::clone(&busy);

        thread::Builder::new()
            .name("stage-runner".into())
            .spawn(move || {
                for request in rx {
                    let stage = request.stage;
                    tracing::info!(%stage, "stage started");
                    let completion =
                        match panic::catch_unwind(AssertUnwindSafe(|| executor(&request))) {
                            Ok(result) => StageCompletion::from_result(stage, &result),
                            Err(_) => StageCompletion {
                                stage,
                                success: false,
                                message: format!("{stage} panicked"),
                            },
                        };
                    drop(request);
                    worker_busy.store(false, Ordering::SeqCst);
                    on_complete(completion);
                }
            })?;

        Ok(Self { tx, busy })
    }

    /// Hand `request` to the worker if it is idle. Returns whether it was accepted.
    pub fn enqueue(&self, request: StageRequest) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(stage = %request.stage, "runner busy, trigger dropped");
            return false;
        }
        match self.tx.try_send(request) {
            Ok(()) => true,
            Err(_) => {
                self.busy.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}
