// SPDX-License-Identifier: GPL-3.0-only

//! Async scanning session
//!
//! One session owns one [`FramePipeline`] on a dedicated blocking worker, so
//! no two decodes ever run at the same time. Frames go in through a bounded
//! channel with room for a single queued frame; frames arriving while that
//! slot is taken are dropped, which keeps latency low when decoding is slower
//! than the camera. Reported detections are published through a watch
//! channel as immutable snapshots that any thread can read.

use super::pipeline::{FrameOutcome, FramePipeline};
use super::types::DetectionResult;
use crate::backends::camera::types::CameraFrame;
use crate::config::ScanConfig;
use crate::errors::{ScanError, ScanResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Latest published state of a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    /// Frames taken off the queue by the worker, skipped ones included
    pub frames: u64,
    /// Frames that went through the decoder
    pub analyzed: u64,
    /// Capture time of the last analyzed frame
    pub captured_at: Option<Instant>,
    /// Stabilized detection to display
    pub detection: Option<DetectionResult>,
    /// The worker has exited and will publish nothing more
    pub stopped: bool,
}

/// Handle to a running scanning session
pub struct ScanSession {
    frames: Option<mpsc::Sender<CameraFrame>>,
    updates_tx: Arc<watch::Sender<SessionUpdate>>,
    updates: watch::Receiver<SessionUpdate>,
    worker: Option<JoinHandle<ScanResult<()>>>,
    shutdown_timeout: Duration,
    dropped: Arc<AtomicU64>,
}

impl ScanSession {
    /// Open the decoder and start the worker
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(config: &ScanConfig) -> ScanResult<Self> {
        let pipeline = FramePipeline::open(config)?;
        Self::start(pipeline, config.shutdown_timeout())
    }

    /// Start a session around an already opened pipeline
    pub fn start(pipeline: FramePipeline, shutdown_timeout: Duration) -> ScanResult<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ScanError::Session(format!("no async runtime: {}", e)))?;

        let (frames_tx, frames_rx) = mpsc::channel(1);
        let (updates_tx, updates) = watch::channel(SessionUpdate::default());
        let updates_tx = Arc::new(updates_tx);

        let worker_tx = Arc::clone(&updates_tx);
        let worker = runtime.spawn_blocking(move || run_worker(pipeline, frames_rx, &worker_tx));

        info!(?shutdown_timeout, "Scan session started");
        Ok(Self {
            frames: Some(frames_tx),
            updates_tx,
            updates,
            worker: Some(worker),
            shutdown_timeout,
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Hand a frame to the worker without waiting
    ///
    /// Returns `Ok(false)` when the frame was dropped because another frame
    /// is still queued. Fails once the session is closed or the worker has
    /// stopped; in the latter case [`close`](Self::close) reports why.
    pub fn submit(&self, frame: CameraFrame) -> ScanResult<bool> {
        let Some(frames) = &self.frames else {
            return Err(ScanError::Session("session is closed".to_string()));
        };
        match frames.try_send(frame) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(ScanError::Session("decode worker has stopped".to_string()))
            }
        }
    }

    /// Wait for queue space, then hand over the frame
    ///
    /// For replaying recorded frames where none may be dropped.
    pub async fn submit_wait(&self, frame: CameraFrame) -> ScanResult<()> {
        let Some(frames) = &self.frames else {
            return Err(ScanError::Session("session is closed".to_string()));
        };
        frames
            .send(frame)
            .await
            .map_err(|_| ScanError::Session("decode worker has stopped".to_string()))
    }

    /// New receiver for published updates
    pub fn subscribe(&self) -> watch::Receiver<SessionUpdate> {
        self.updates.clone()
    }

    /// Most recently published update
    pub fn latest(&self) -> SessionUpdate {
        self.updates.borrow().clone()
    }

    /// Frames dropped by [`submit`](Self::submit) because the queue was full
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting frames, wait a bounded time for the worker, clear state
    ///
    /// A frame that is still decoding when the timeout expires is abandoned;
    /// the worker releases the decoder on its own once it finishes and its
    /// result is never published. Errors
    /// that stopped the worker early (malformed input) are returned here.
    pub async fn close(mut self) -> ScanResult<()> {
        self.frames.take();
        let result = match self.worker.take() {
            Some(worker) => match tokio::time::timeout(self.shutdown_timeout, worker).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => Err(ScanError::Session(format!("decode worker failed: {}", e))),
                Err(_) => {
                    warn!(
                        timeout_ms = self.shutdown_timeout.as_millis(),
                        "Decode worker did not stop in time, abandoning frame"
                    );
                    Ok(())
                }
            },
            None => Ok(()),
        };
        self.updates_tx.send_replace(SessionUpdate {
            stopped: true,
            ..SessionUpdate::default()
        });
        info!(dropped = self.dropped_frames(), "Scan session closed");
        result
    }
}

fn run_worker(
    mut pipeline: FramePipeline,
    mut frames: mpsc::Receiver<CameraFrame>,
    updates: &watch::Sender<SessionUpdate>,
) -> ScanResult<()> {
    while let Some(frame) = frames.blocking_recv() {
        let outcome = match pipeline.process(&frame) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Stopping decode worker");
                // Refuse further frames before announcing the stop
                frames.close();
                pipeline.close();
                updates.send_if_modified(mark_stopped);
                return Err(e);
            }
        };

        // Checked under the channel lock so a result never lands after close
        let published = updates.send_if_modified(|u| {
            if u.stopped {
                return false;
            }
            u.frames += 1;
            if let FrameOutcome::Analyzed(detection) = outcome {
                u.analyzed += 1;
                u.captured_at = Some(frame.captured_at);
                u.detection = detection;
            }
            true
        });
        if !published {
            debug!("Session already closed, discarding late result");
            break;
        }
    }

    pipeline.close();
    updates.send_if_modified(mark_stopped);
    debug!(
        attempts = pipeline.decode_attempts(),
        "Decode worker finished"
    );
    Ok(())
}

fn mark_stopped(update: &mut SessionUpdate) -> bool {
    if update.stopped {
        return false;
    }
    update.stopped = true;
    true
}
