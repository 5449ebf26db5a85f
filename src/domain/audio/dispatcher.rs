use super::worker::DocumentAudioWorker;
use crate::domain::tts::{AudioFormat, Engine};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Everything a worker needs to execute one synthesis job. Claimed before
/// enqueue, so the job always refers to a PROCESSING document.
#[derive(Debug, Clone)]
pub struct TtsJob {
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub voice: String,
    pub engine: Engine,
    pub format: AudioFormat,
    pub target_lang: Option<String>,
    pub unlimited: bool,
}

/// Bounded hand-off between the Job Starter and the worker pool.
///
/// `spawn` starts `worker_count` tasks pulling from one shared queue of
/// `queue_capacity` slots. Dispatch never blocks: a full queue returns the
/// job to the caller, which is expected to release the document claim and
/// surface backpressure. The pool drains and exits when the dispatcher is
/// dropped.
pub struct TtsDispatcher {
    tx: mpsc::Sender<TtsJob>,
}

impl TtsDispatcher {
    pub fn spawn(
        worker: Arc<DocumentAudioWorker>,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<TtsJob>(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker_index in 0..worker_count.max(1) {
            let worker = worker.clone();
            let rx = rx.clone();
            tokio::spawn(async move {
                tracing::debug!(worker_index = worker_index, "Audio worker started");
                loop {
                    // Hold the lock only while receiving, so other workers
                    // keep pulling while this one processes.
                    let job = rx.lock().await.recv().await;
                    match job {
                        Some(job) => worker.process(job).await,
                        None => break,
                    }
                }
                tracing::debug!(worker_index = worker_index, "Audio worker stopped");
            });
        }

        Self { tx }
    }

    /// Non-blocking enqueue. `Err` hands the job back when the queue is full
    /// or the pool is gone.
    pub fn try_dispatch(&self, job: TtsJob) -> Result<(), TtsJob> {
        self.tx.try_send(job).map_err(|err| {
            let job = match err {
                mpsc::error::TrySendError::Full(job) => {
                    tracing::warn!(
                        document_id = %job.document_id,
                        "Audio queue full, rejecting job"
                    );
                    job
                }
                mpsc::error::TrySendError::Closed(job) => {
                    tracing::error!(
                        document_id = %job.document_id,
                        "Audio worker pool is down, rejecting job"
                    );
                    job
                }
            };
            job
        })
    }
}
