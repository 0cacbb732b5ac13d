//! Synchronous frame capture on top of an asynchronous readback API
//!
//! [`render_snapshot`] begins a frame, renders the view, requests a pixel
//! readback and ends the frame, then blocks until the engine's completion
//! callback has written the image. The callback runs on a thread owned by
//! the engine; it hands the pixel buffer back through a channel, so the
//! buffer cannot be released before the callback has fired.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use viscrate_core::{Error, Result};
use viscrate_gpu::{FrameRenderer, PixelBuffer, PixelRect, SwapChainHandle, ViewHandle};
use viscrate_io::write_image;

/// Readback wait used when none is configured
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BEGIN_ATTEMPTS: u32 = 3;

/// Capture tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Longest wait for the readback callback
    pub timeout: Duration,
    /// Frame starts to try before giving up
    pub begin_attempts: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CAPTURE_TIMEOUT,
            begin_attempts: DEFAULT_BEGIN_ATTEMPTS,
        }
    }
}

/// What the completion callback did with the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The image file was written
    Saved,
    /// Pixels arrived but the file could not be written
    WriteFailed,
    /// No filename or no pixels; nothing was written
    Discarded,
}

/// Progress of one capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CaptureState {
    NotStarted,
    FrameBegun,
    ReadbackIssued,
    FrameEnded,
    Complete,
}

/// Per-frame completion token carried into the readback callback
#[derive(Debug)]
struct RenderRequest {
    filename: PathBuf,
    /// Set once the caller stopped waiting; a late readback is not written
    cancelled: Arc<AtomicBool>,
}

impl RenderRequest {
    fn new(filename: &Path, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            filename: filename.to_path_buf(),
            cancelled,
        }
    }

    /// Save the read-back pixels
    fn complete(&self, buffer: &PixelBuffer) -> CaptureOutcome {
        if self.cancelled.load(Ordering::Acquire) {
            log::warn!("readback for {} arrived after the capture gave up", self.filename.display());
            return CaptureOutcome::Discarded;
        }
        if self.filename.as_os_str().is_empty() || buffer.transferred() == 0 {
            log::error!(
                "readback finished without a destination or pixels (file {:?}, {} bytes)",
                self.filename,
                buffer.transferred()
            );
            return CaptureOutcome::Discarded;
        }

        match write_image(&self.filename, &buffer.to_image()) {
            Ok(()) => {
                log::debug!("wrote {}", self.filename.display());
                CaptureOutcome::Saved
            }
            Err(e) => {
                log::warn!("could not write {}: {}", self.filename.display(), e);
                CaptureOutcome::WriteFailed
            }
        }
    }
}

struct Capture {
    state: CaptureState,
}

impl Capture {
    fn advance(&mut self, next: CaptureState) {
        debug_assert!(next >= self.state, "capture moved back from {:?} to {:?}", self.state, next);
        log::trace!("capture {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Render `view` once and write it to `filename`
///
/// Returns after the readback callback has fired. Soft failures (an image
/// that could not be written, an empty readback) are reported through
/// [`CaptureOutcome`]; an engine that refuses every frame start, drops the
/// callback or does not answer within `options.timeout` is an error.
pub fn render_snapshot<R: FrameRenderer + ?Sized>(
    renderer: &mut R,
    view: ViewHandle,
    swap_chain: SwapChainHandle,
    width: u32,
    height: u32,
    filename: &Path,
    options: &CaptureOptions,
) -> Result<CaptureOutcome> {
    let mut capture = Capture {
        state: CaptureState::NotStarted,
    };
    let (sender, receiver) = flume::bounded::<(CaptureOutcome, PixelBuffer)>(1);
    let mut buffer = Some(PixelBuffer::new(width, height));
    let cancelled = Arc::new(AtomicBool::new(false));
    let attempts = options.begin_attempts.max(1);

    for attempt in 1..=attempts {
        if renderer.begin_frame(swap_chain) {
            capture.advance(CaptureState::FrameBegun);
            renderer.render(view);

            if let Some(buffer) = buffer.take() {
                let request = RenderRequest::new(filename, Arc::clone(&cancelled));
                let sender = sender.clone();
                renderer.read_pixels(
                    PixelRect::full(width, height),
                    buffer,
                    Box::new(move |buffer: PixelBuffer| {
                        let outcome = request.complete(&buffer);
                        let _ = sender.send((outcome, buffer));
                    }),
                );
                capture.advance(CaptureState::ReadbackIssued);
            }
        } else {
            log::warn!("engine declined to begin frame (attempt {} of {})", attempt, attempts);
        }

        renderer.end_frame();
        if buffer.is_none() {
            capture.advance(CaptureState::FrameEnded);
            break;
        }
    }
    drop(sender);

    if buffer.is_some() {
        return Err(Error::Render(format!(
            "engine declined to begin frame {} times for {}",
            attempts,
            filename.display()
        )));
    }

    match receiver.recv_timeout(options.timeout) {
        Ok((outcome, buffer)) => {
            drop(buffer);
            capture.advance(CaptureState::Complete);
            Ok(outcome)
        }
        Err(flume::RecvTimeoutError::Timeout) => {
            cancelled.store(true, Ordering::Release);
            Err(Error::Timeout(format!(
                "no readback for {} after {:?} (state {:?})",
                filename.display(),
                options.timeout,
                capture.state
            )))
        }
        Err(flume::RecvTimeoutError::Disconnected) => Err(Error::Render(format!(
            "readback callback for {} was dropped without firing",
            filename.display()
        ))),
    }
}
