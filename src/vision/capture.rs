//! Video capture from a camera device
//!
//! A dedicated thread owns the camera stream and keeps the most recent frame
//! in a shared slot; consumers read the latest frame without touching the
//! device directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::JoinHandle;

use image::RgbImage;
use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

use crate::{Error, Result};

/// Captures video frames from a camera device
pub struct CameraCapture {
    index: u32,
    latest: Arc<Mutex<Option<RgbImage>>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

/// Cloneable read handle to the most recent captured frame
#[derive(Clone)]
pub struct FrameHandle {
    latest: Arc<Mutex<Option<RgbImage>>>,
}

impl FrameHandle {
    /// Get a copy of the most recent frame, if any has been captured yet
    #[must_use]
    pub fn latest(&self) -> Option<RgbImage> {
        self.latest.lock().map(|slot| slot.clone()).unwrap_or_default()
    }
}

impl CameraCapture {
    /// Create a capture instance for the given camera index
    ///
    /// The device is not opened until [`start`](Self::start) is called.
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self {
            index,
            latest: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Get a handle for reading captured frames
    #[must_use]
    pub fn frame_handle(&self) -> FrameHandle {
        FrameHandle {
            latest: Arc::clone(&self.latest),
        }
    }

    /// Start capturing frames
    ///
    /// Blocks until the device is open. On failure no capture state is
    /// changed, so a failed start can be retried.
    ///
    /// # Errors
    ///
    /// Returns error if the camera cannot be opened
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let latest = Arc::clone(&self.latest);
        let running = Arc::clone(&self.running);
        let index = self.index;

        running.store(true, Ordering::SeqCst);

        let worker = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || {
                let requested = RequestedFormat::new::<RgbFormat>(
                    RequestedFormatType::AbsoluteHighestFrameRate,
                );
                let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
                    Ok(camera) => camera,
                    Err(e) => {
                        let _ = ready_tx.send(Err(Error::Camera(e.to_string())));
                        return;
                    }
                };
                if let Err(e) = camera.open_stream() {
                    let _ = ready_tx.send(Err(Error::Camera(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                while running.load(Ordering::SeqCst) {
                    match camera.frame().and_then(|f| f.decode_image::<RgbFormat>()) {
                        Ok(frame) => {
                            if let Ok(mut slot) = latest.lock() {
                                *slot = Some(frame);
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "frame grab failed");
                        }
                    }
                }

                if let Err(e) = camera.stop_stream() {
                    tracing::warn!(error = %e, "failed to stop camera stream");
                }
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(worker);
                tracing::debug!(camera = index, "camera capture started");
                Ok(())
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = worker.join();
                Err(Error::Camera("capture thread exited during startup".to_string()))
            }
        }
    }

    /// Stop capturing and release the device
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            tracing::debug!("camera capture stopped");
        }
        if let Ok(mut slot) = self.latest.lock() {
            *slot = None;
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
