use std::mem;
use std::time::{Duration, Instant};

use super::{Callback, Completion, LoadFailure, MAX_PENDING_PROGRESS};

/// The lifecycle state machine wrapped by every loader.
pub struct LoaderState<T> {
    path: String,
    progress: f32,
    finished: bool,
    disposed: bool,
    result: Option<T>,
    failure: Option<LoadFailure>,
    callbacks: Vec<Callback<T>>,
    created: Instant,
    elapsed: Option<Duration>,
}

impl<T: Clone> LoaderState<T> {
    pub fn new<P: Into<String>>(path: P) -> Self {
        LoaderState {
            path: path.into(),
            progress: 0.0,
            finished: false,
            disposed: false,
            result: None,
            failure: None,
            callbacks: Vec::new(),
            created: Instant::now(),
            elapsed: None,
        }
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[inline]
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    #[inline]
    pub fn failure(&self) -> Option<LoadFailure> {
        self.failure
    }

    /// Time spent between construction and completion.
    #[inline]
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Updates the progress of an in-flight load. Values are clamped to
    /// `MAX_PENDING_PROGRESS`, and anything lower than the current progress is ignored.
    pub fn set_progress(&mut self, progress: f32) {
        if self.finished || self.disposed {
            return;
        }

        if progress > self.progress {
            self.progress = progress.min(MAX_PENDING_PROGRESS);
        }
    }

    /// Completes the load. Returns false, leaving everything untouched, if the loader has
    /// finished or been disposed already.
    pub fn finish(&mut self, result: Option<T>) -> bool {
        if self.disposed {
            debug!("[LoaderState] Drops result of disposed loader {}.", self.path);
            return false;
        }

        if self.finished {
            warn!("[LoaderState] Loader {} has finished already.", self.path);
            return false;
        }

        let elapsed = self.created.elapsed();
        debug!(
            "[LoaderState] Loader {} finished in {:?} ({}).",
            self.path,
            elapsed,
            if result.is_some() { "ok" } else { "none" }
        );

        if result.is_some() {
            self.progress = 1.0;
        }

        self.finished = true;
        self.elapsed = Some(elapsed);
        self.result = result;
        true
    }

    /// Completes the load with no result, recording the reason.
    pub fn fail(&mut self, failure: LoadFailure) -> bool {
        if self.finish(None) {
            self.failure = Some(failure);
            true
        } else {
            false
        }
    }

    /// Marks the loader disposed, dropping pending callbacks. Returns true only on the
    /// first call.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }

        self.disposed = true;
        self.callbacks.clear();
        true
    }

    /// Registers a completion callback. If the loader has finished already, the callback
    /// is returned as a `Completion` to be fired by the caller right away.
    pub fn on_finish(&mut self, func: Callback<T>) -> Option<Completion<T>> {
        if self.disposed {
            return None;
        }

        if self.finished {
            Some(Completion::new(self.result.clone(), vec![func]))
        } else {
            self.callbacks.push(func);
            None
        }
    }

    /// Takes the callbacks that became ready since the last call.
    pub fn take_completion(&mut self) -> Option<Completion<T>> {
        if !self.finished || self.disposed || self.callbacks.is_empty() {
            return None;
        }

        let callbacks = mem::replace(&mut self.callbacks, Vec::new());
        Some(Completion::new(self.result.clone(), callbacks))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<Option<u32>>>>, impl Fn() -> Callback<u32>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let tx = records.clone();
        let make = move || -> Callback<u32> {
            let tx = tx.clone();
            Box::new(move |v: Option<u32>| tx.lock().unwrap().push(v))
        };

        (records, make)
    }

    #[test]
    fn progress() {
        let mut state = LoaderState::<u32>::new("a");
        assert_eq!(state.progress(), 0.0);

        state.set_progress(0.5);
        state.set_progress(0.25);
        assert_eq!(state.progress(), 0.5);

        state.set_progress(1.0);
        assert_eq!(state.progress(), MAX_PENDING_PROGRESS);
        state.set_progress(2.0);
        assert_eq!(state.progress(), MAX_PENDING_PROGRESS);

        assert!(state.fail(LoadFailure::FetchFailed));
        assert!(state.progress() < 1.0);

        let mut state = LoaderState::<u32>::new("b");
        state.set_progress(::std::f32::NAN);
        state.set_progress(-1.0);
        assert_eq!(state.progress(), 0.0);
    }

    #[test]
    fn finish_once() {
        let (records, make) = recorder();
        let mut state = LoaderState::new("a");
        assert!(state.on_finish(make()).is_none());
        assert!(state.take_completion().is_none());

        assert!(state.finish(Some(7)));
        assert_eq!(state.progress(), 1.0);
        assert!(!state.finish(Some(8)));
        assert!(!state.fail(LoadFailure::NotFound));
        assert_eq!(state.result(), Some(&7));
        assert_eq!(state.failure(), None);
        assert!(state.elapsed().is_some());

        state.take_completion().unwrap().fire();
        assert!(state.take_completion().is_none());
        assert_eq!(*records.lock().unwrap(), vec![Some(7)]);

        state.set_progress(0.2);
        assert_eq!(state.progress(), 1.0);

        state.on_finish(make()).unwrap().fire();
        assert_eq!(*records.lock().unwrap(), vec![Some(7), Some(7)]);
    }

    #[test]
    fn fail() {
        let (records, make) = recorder();
        let mut state = LoaderState::new("a");
        state.set_progress(0.7);
        state.on_finish(make());

        assert!(state.fail(LoadFailure::FetchFailed));
        assert_eq!(state.progress(), 0.7);
        assert_eq!(state.result(), None);
        assert_eq!(state.failure(), Some(LoadFailure::FetchFailed));

        state.take_completion().unwrap().fire();
        assert_eq!(*records.lock().unwrap(), vec![None]);
    }

    #[test]
    fn dispose() {
        let (records, make) = recorder();
        let mut state = LoaderState::new("a");
        state.on_finish(make());

        assert!(state.dispose());
        assert!(!state.dispose());
        assert!(state.is_disposed());

        assert!(!state.finish(Some(1)));
        assert!(state.on_finish(make()).is_none());
        assert!(state.take_completion().is_none());

        state.set_progress(0.5);
        assert_eq!(state.progress(), 0.0);
        assert!(records.lock().unwrap().is_empty());
    }
}
