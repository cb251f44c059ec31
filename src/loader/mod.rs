//! The lifecycle shared by every kind of loader.
//!
//! # Loader
//!
//! A loader performs exactly one retrieval and reports exactly one terminal outcome. It is
//! made of two parts: a concrete strategy implementing the `Loader` trait, like the
//! `BytesLoader`, and a `LoaderState` it wraps, which guards the rules every strategy must
//! follow:
//!
//! 1. Progress lies in `[0, 1]` and never decreases while the load is in flight. It stays
//! below 1.0 until the load finishes with a result.
//! 2. Completion fires at most once. After completion or disposal, neither the progress nor
//! the result changes any more.
//! 3. Disposal is idempotent, and a disposed loader never completes.
//!
//! # LoaderPool
//!
//! Loaders are identified by the `LoadRequest` they were created for. The `LoaderPool`
//! hands out the same loader to identical requests while it is alive, counting references,
//! and only disposes it once the last reference is released. Completion callbacks are
//! handed back to the caller as `Completion`s, so they are always invoked with no lock
//! held and could freely release the loader they were called for.

pub mod context;
pub mod pool;
pub mod state;

pub mod prelude {
    pub use super::context::LoaderContext;
    pub use super::pool::LoaderPool;
    pub use super::state::LoaderState;
    pub use super::{Completion, LoadFailure, LoadRequest, Loader, LoaderMode, MAX_PENDING_PROGRESS};
}

use crate::errors::*;

use self::state::LoaderState;

/// Upper bound of the progress of an in-flight load. Only a successful finish reaches 1.0.
pub const MAX_PENDING_PROGRESS: f32 = 0.99;

/// Selects how bytes are retrieved. Immutable for the lifetime of one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderMode {
    /// Reads on the calling thread, finishing before the loader is handed out.
    Sync,
    /// Fetches through a `StreamFetch`, polled once per tick.
    Async,
}

/// Why a loader finished with no result.
///
/// The result itself stays `None` in both cases; this is an additional hint for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadFailure {
    NotFound,
    FetchFailed,
}

/// Identity of a loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadRequest {
    path: String,
    mode: LoaderMode,
    args: Vec<String>,
}

impl LoadRequest {
    pub fn new<T: Into<String>>(path: T, mode: LoaderMode) -> Self {
        LoadRequest {
            path: path.into(),
            mode,
            args: Vec::new(),
        }
    }

    /// Appends an extra argument, which takes part in the identity of the request.
    pub fn with_arg<T: Into<String>>(mut self, arg: T) -> Self {
        self.args.push(arg.into());
        self
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn mode(&self) -> LoaderMode {
        self.mode
    }

    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

pub type Callback<T> = Box<dyn FnOnce(Option<T>) + Send>;

/// Callbacks of a finished loader that are ready to be invoked.
pub struct Completion<T> {
    result: Option<T>,
    callbacks: Vec<Callback<T>>,
}

impl<T: Clone> Completion<T> {
    pub(crate) fn new(result: Option<T>, callbacks: Vec<Callback<T>>) -> Self {
        Completion { result, callbacks }
    }

    /// Invokes the callbacks in registering order.
    pub fn fire(self) {
        let result = self.result;
        for func in self.callbacks {
            func(result.clone());
        }
    }
}

/// A concrete loading strategy.
pub trait Loader: Send {
    type Output: Clone + Send;

    fn state(&self) -> &LoaderState<Self::Output>;

    fn state_mut(&mut self) -> &mut LoaderState<Self::Output>;

    /// Runs the synchronous part of the load. It is called exactly once, right after
    /// construction. Errors returned here are fatal to the load.
    fn start(&mut self) -> Result<()>;

    /// Resumes the load, once per tick, until it finishes or gets disposed.
    fn advance(&mut self) -> Result<()>;

    /// Releases the resources held by this loader. Only the first call has effects.
    fn dispose(&mut self, teardown: bool);

    #[inline]
    fn progress(&self) -> f32 {
        self.state().progress()
    }

    #[inline]
    fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    #[inline]
    fn is_disposed(&self) -> bool {
        self.state().is_disposed()
    }
}
