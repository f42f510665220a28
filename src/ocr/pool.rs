//! Bounded fan-out of OCR work over the sampled frames.
//!
//! Jobs go onto a shared channel consumed by a fixed number of worker
//! threads; each worker blocks on one external OCR invocation at a time and
//! sends exactly one result per job. The caller collects results until every
//! worker has finished, which is the fan-in barrier the merge runs behind.
//! No ordering is guaranteed between workers; the merge imposes order later.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::frames::FrameJob;
use crate::ocr::recognizer::TextRecognizer;

/// One recognizer output per dispatched frame. Empty text means the
/// recognizer failed or the frame had no readable text; it is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    pub second_offset: u32,
    pub text: String,
}

/// Cancellation hook at the pool boundary. Once set, workers stop invoking
/// the recognizer and drain the remaining queue as empty-text results, so the
/// one-result-per-job invariant still holds and the collector never hangs.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Default worker count: half the logical cores, minimum one, leaving
/// headroom for the OCR processes' own CPU use.
pub fn default_worker_count() -> usize {
    let cores = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    (cores / 2).max(1)
}

/// Run OCR over every frame job with `workers` concurrent workers and return
/// one result per job, in completion order.
///
/// Workers share only the job queue and the result channel. If `workers`
/// exceeds the job count, the excess workers observe an empty queue and exit.
pub fn run_pool(
    jobs: &[FrameJob],
    frames_dir: &Path,
    language: &str,
    workers: usize,
    recognizer: Arc<dyn TextRecognizer>,
    cancel: &CancelFlag,
) -> Vec<RawResult> {
    let workers = workers.max(1);
    let (job_tx, job_rx) = unbounded::<FrameJob>();
    let (result_tx, result_rx) = unbounded::<RawResult>();

    tracing::info!(
        "dispatching {} frames to {} {} worker(s)",
        jobs.len(),
        workers,
        recognizer.name()
    );

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let rx = job_rx.clone();
        let tx = result_tx.clone();
        let recognizer = Arc::clone(&recognizer);
        let frames_dir = frames_dir.to_path_buf();
        let language = language.to_string();
        let cancel = cancel.clone();
        handles.push(thread::spawn(move || {
            worker_loop(worker_id, rx, tx, recognizer, &frames_dir, &language, &cancel)
        }));
    }
    drop(job_rx);
    drop(result_tx);

    for job in jobs {
        // Cannot fail while worker receivers are alive.
        let _ = job_tx.send(job.clone());
    }
    drop(job_tx);

    // Fan-in barrier: the iterator ends once every worker has processed its
    // last job and dropped its sender clone.
    let results: Vec<RawResult> = result_rx.iter().collect();

    for handle in handles {
        let _ = handle.join();
    }

    results
}

fn worker_loop(
    worker_id: usize,
    jobs: Receiver<FrameJob>,
    results: Sender<RawResult>,
    recognizer: Arc<dyn TextRecognizer>,
    frames_dir: &Path,
    language: &str,
    cancel: &CancelFlag,
) {
    for job in jobs.iter() {
        let text = if cancel.is_cancelled() {
            tracing::debug!("worker {} draining {} (cancelled)", worker_id, job.frame_id);
            String::new()
        } else {
            recognizer.read(&frames_dir.join(&job.frame_id), language)
        };
        let _ = results.send(RawResult {
            second_offset: job.second_offset,
            text,
        });
    }
}
