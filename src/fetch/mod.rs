//! Non-blocking stream fetching.
//!
//! A `StreamFetch` is the pluggable primitive that begins requests for fully-qualified
//! locations. It never blocks: each call of `FetchRequest::poll` drives the request one
//! step further and reports where it is. The `StreamFetcher` wraps exactly one of those
//! requests for a loader, caching its completion, success and progress, and makes sure it
//! is released once.

pub mod file;
pub mod schema;

pub mod prelude {
    pub use super::file::FileFetch;
    pub use super::schema::SchemaFetch;
    pub use super::{FetchRequest, FetchState, StreamFetch, StreamFetcher};
}

use crate::loader::MAX_PENDING_PROGRESS;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    /// Still in flight, with the fraction of bytes received so far.
    Pending(f32),
    Succeeded,
    Failed(String),
}

pub trait StreamFetch: Send + Sync {
    /// Begins fetching `location`. Failures are reported by the returned request, never
    /// by this call.
    fn begin(&self, location: &str) -> Box<dyn FetchRequest>;
}

pub trait FetchRequest: Send {
    /// Drives the request one step and returns its latest state. Once the request has
    /// left `FetchState::Pending`, its state never changes again.
    fn poll(&mut self) -> FetchState;

    /// Takes the received bytes of a succeeded request.
    fn take_bytes(&mut self) -> Option<Vec<u8>>;

    /// Releases the underlying resources, cancelling the request if it is still in
    /// flight. `teardown` is set if the host environment is shutting down.
    fn release(&mut self, teardown: bool);
}

/// A single fetch owned by a loader.
pub struct StreamFetcher {
    location: String,
    request: Option<Box<dyn FetchRequest>>,
    completed: bool,
    success: bool,
    progress: f32,
}

impl StreamFetcher {
    /// Begins fetching `location` with `fetch`.
    pub fn begin(fetch: &dyn StreamFetch, location: &str) -> Self {
        debug!("[StreamFetcher] Begins {}.", location);

        StreamFetcher {
            location: location.to_owned(),
            request: Some(fetch.begin(location)),
            completed: false,
            success: false,
            progress: 0.0,
        }
    }

    /// Polls the underlying request once. Does nothing after completion or release.
    pub fn poll(&mut self) {
        if self.completed {
            return;
        }

        let request = match self.request.as_mut() {
            Some(request) => request,
            None => return,
        };

        match request.poll() {
            FetchState::Pending(progress) => {
                if progress > self.progress {
                    self.progress = progress.min(MAX_PENDING_PROGRESS);
                }
            }
            FetchState::Succeeded => {
                self.completed = true;
                self.success = true;
                self.progress = 1.0;
            }
            FetchState::Failed(reason) => {
                warn!("[StreamFetcher] {} failed: {}.", self.location, reason);
                self.completed = true;
            }
        }
    }

    #[inline]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.success
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.request.is_none()
    }

    /// Takes the fetched bytes. Returns `None` unless the fetch has succeeded.
    pub fn take_bytes(&mut self) -> Option<Vec<u8>> {
        if !self.success {
            return None;
        }

        self.request.as_mut().and_then(|v| v.take_bytes())
    }

    /// Releases the request. Returns false if it has been released already.
    pub fn release(&mut self, teardown: bool) -> bool {
        match self.request.take() {
            Some(mut request) => {
                debug!(
                    "[StreamFetcher] Releases {} (completed: {}, teardown: {}).",
                    self.location, self.completed, teardown
                );
                request.release(teardown);
                true
            }
            None => false,
        }
    }
}

impl Drop for StreamFetcher {
    fn drop(&mut self) {
        self.release(false);
    }
}
