use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::errors::*;
use crate::utils::prelude::{HandleLike, ObjectPool};

use super::{Callback, Completion, LoadFailure, LoadRequest, Loader};

/// Reference-counted collection of live loaders, keyed by their `LoadRequest`.
///
/// Every `create` of a request that already has a live loader increases the reference
/// count of that loader by 1, and every `release` decreases it. A loader whose count
/// drops to zero is kept around for `gc_interval` so a quick re-request could revive it,
/// and is disposed after that. `release_now` skips the grace period.
pub struct LoaderPool<H, L>
where
    H: HandleLike + 'static,
    L: Loader,
{
    items: ObjectPool<H, Entry<L>>,
    requests: HashMap<LoadRequest, H>,
    gc_interval: Duration,
}

struct Entry<L> {
    rc: u32,
    request: LoadRequest,
    loader: L,
    released: Option<Instant>,
}

impl<H, L> LoaderPool<H, L>
where
    H: HandleLike + 'static,
    L: Loader,
{
    pub fn new(gc_interval: Duration) -> Self {
        LoaderPool {
            items: ObjectPool::new(),
            requests: HashMap::new(),
            gc_interval,
        }
    }

    /// Returns the live loader of `request`, or creates and starts a new one with `func`.
    ///
    /// If starting fails, the new loader is disposed and the error is returned.
    pub fn create<F>(&mut self, request: LoadRequest, func: F) -> Result<H>
    where
        F: FnOnce(&LoadRequest) -> L,
    {
        if let Some(&handle) = self.requests.get(&request) {
            if let Some(entry) = self.items.get_mut(handle) {
                entry.rc += 1;
                entry.released = None;

                debug!(
                    "[LoaderPool] Reuses loader of {:?} (rc: {}).",
                    request, entry.rc
                );
                return Ok(handle);
            }
        }

        let mut loader = func(&request);
        if let Err(err) = loader.start() {
            loader.dispose(false);
            return Err(err);
        }

        let handle = self.items.create(Entry {
            rc: 1,
            request: request.clone(),
            loader,
            released: None,
        });

        self.requests.insert(request, handle);
        Ok(handle)
    }

    /// Registers a completion callback of `handle`. It is handed back at once as a
    /// `Completion` if the loader has finished already. Stale handles drop `func`.
    pub fn on_finish(
        &mut self,
        handle: H,
        func: Callback<L::Output>,
    ) -> Option<Completion<L::Output>> {
        match self.items.get_mut(handle) {
            Some(entry) => entry.loader.state_mut().on_finish(func),
            None => {
                warn!("[LoaderPool] Ignores callback of stale loader {:?}.", handle);
                None
            }
        }
    }

    /// Resumes every unfinished loader once, disposes loaders whose grace period expired,
    /// and returns the completions that became ready.
    ///
    /// A loader failing to advance is fatal. The error is returned after every loader got
    /// its tick, and ready completions stay queued until the next call.
    pub fn advance(&mut self) -> Result<Vec<Completion<L::Output>>> {
        let now = Instant::now();
        let handles: Vec<H> = self.items.keys().collect();

        let mut expired = Vec::new();
        let mut result = Ok(());

        for &handle in &handles {
            let entry = match self.items.get_mut(handle) {
                Some(entry) => entry,
                None => continue,
            };

            if let Some(ts) = entry.released {
                if now.duration_since(ts) >= self.gc_interval {
                    expired.push(handle);
                    continue;
                }
            }

            if entry.loader.is_finished() || entry.loader.is_disposed() {
                continue;
            }

            if let Err(err) = entry.loader.advance() {
                error!(
                    "[LoaderPool] Failed to advance loader of {:?}: {}",
                    entry.request, err
                );

                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        for handle in expired {
            debug!("[LoaderPool] Collects released loader {:?}.", handle);
            self.dispose(handle, false);
        }

        result?;

        let mut completions = Vec::new();
        for handle in handles {
            if let Some(entry) = self.items.get_mut(handle) {
                if let Some(completion) = entry.loader.state_mut().take_completion() {
                    completions.push(completion);
                }
            }
        }

        Ok(completions)
    }

    /// Drops a reference of `handle`, parking the loader for delayed disposal once the
    /// last reference is gone.
    pub fn release(&mut self, handle: H) {
        if self.dec(handle) {
            if self.gc_interval == Duration::from_secs(0) {
                self.dispose(handle, false);
            } else if let Some(entry) = self.items.get_mut(handle) {
                entry.released = Some(Instant::now());
            }
        }
    }

    /// Drops a reference of `handle`, disposing the loader at once if it was the last.
    pub fn release_now(&mut self, handle: H) {
        if self.dec(handle) {
            self.dispose(handle, false);
        }
    }

    /// Disposes all the loaders because the host is shutting down.
    pub fn teardown(&mut self) {
        let handles: Vec<H> = self.items.keys().collect();
        if !handles.is_empty() {
            info!("[LoaderPool] Tears down {} loaders.", handles.len());
        }

        for handle in handles {
            self.dispose(handle, true);
        }
    }

    #[inline]
    pub fn get(&self, handle: H) -> Option<&L> {
        self.items.get(handle).map(|e| &e.loader)
    }

    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        self.items.contains(handle)
    }

    /// Returns the number of references to `handle`.
    #[inline]
    pub fn references(&self, handle: H) -> u32 {
        self.items.get(handle).map(|e| e.rc).unwrap_or(0)
    }

    #[inline]
    pub fn progress(&self, handle: H) -> f32 {
        self.get(handle).map(|v| v.progress()).unwrap_or(0.0)
    }

    #[inline]
    pub fn is_finished(&self, handle: H) -> bool {
        self.get(handle).map(|v| v.is_finished()).unwrap_or(false)
    }

    #[inline]
    pub fn result(&self, handle: H) -> Option<L::Output> {
        self.get(handle).and_then(|v| v.state().result().cloned())
    }

    #[inline]
    pub fn failure(&self, handle: H) -> Option<LoadFailure> {
        self.get(handle).and_then(|v| v.state().failure())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn dec(&mut self, handle: H) -> bool {
        match self.items.get_mut(handle) {
            Some(entry) if entry.rc > 0 => {
                entry.rc -= 1;
                entry.rc == 0
            }
            _ => false,
        }
    }

    fn dispose(&mut self, handle: H, teardown: bool) {
        if let Some(mut entry) = self.items.free(handle) {
            if self.requests.get(&entry.request) == Some(&handle) {
                self.requests.remove(&entry.request);
            }

            debug!(
                "[LoaderPool] Disposes loader of {:?} (teardown: {}).",
                entry.request, teardown
            );
            entry.loader.dispose(teardown);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loader::state::LoaderState;
    use crate::loader::LoaderMode;
    use crate::utils::handle::Handle;
    use std::sync::{Arc, Mutex};

    /// Finishes with its tick count after `ticks` ticks.
    struct Countdown {
        state: LoaderState<u32>,
        ticks: u32,
        elapsed: u32,
        disposes: Arc<Mutex<Vec<bool>>>,
    }

    impl Loader for Countdown {
        type Output = u32;

        fn state(&self) -> &LoaderState<u32> {
            &self.state
        }

        fn state_mut(&mut self) -> &mut LoaderState<u32> {
            &mut self.state
        }

        fn start(&mut self) -> Result<()> {
            if self.ticks == 0 {
                self.state.finish(Some(0));
            }

            Ok(())
        }

        fn advance(&mut self) -> Result<()> {
            self.elapsed += 1;
            self.state.set_progress(self.elapsed as f32 / self.ticks as f32);
            if self.elapsed >= self.ticks {
                self.state.finish(Some(self.elapsed));
            }

            Ok(())
        }

        fn dispose(&mut self, teardown: bool) {
            if self.state.dispose() {
                self.disposes.lock().unwrap().push(teardown);
            }
        }
    }

    struct Testbed {
        pool: LoaderPool<Handle, Countdown>,
        disposes: Arc<Mutex<Vec<bool>>>,
    }

    impl Testbed {
        fn new(gc_interval: Duration) -> Self {
            Testbed {
                pool: LoaderPool::new(gc_interval),
                disposes: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn create(&mut self, path: &str, ticks: u32) -> Handle {
            let disposes = self.disposes.clone();
            self.pool
                .create(LoadRequest::new(path, LoaderMode::Async), move |req| Countdown {
                    state: LoaderState::new(req.path()),
                    ticks,
                    elapsed: 0,
                    disposes,
                })
                .unwrap()
        }

        fn tick(&mut self) -> usize {
            let completions = self.pool.advance().unwrap();
            let len = completions.len();
            for v in completions {
                v.fire();
            }
            len
        }
    }

    #[test]
    fn reuse() {
        let mut testbed = Testbed::new(Duration::from_secs(0));
        let h1 = testbed.create("a", 2);
        let h2 = testbed.create("a", 2);
        let h3 = testbed.create("b", 2);

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(testbed.pool.references(h1), 2);
        assert_eq!(testbed.pool.len(), 2);

        let request = LoadRequest::new("a", LoaderMode::Async).with_arg("x");
        let h4 = testbed
            .pool
            .create(request, |req| Countdown {
                state: LoaderState::new(req.path()),
                ticks: 1,
                elapsed: 0,
                disposes: Arc::new(Mutex::new(Vec::new())),
            })
            .unwrap();
        assert_ne!(h1, h4);
    }

    #[test]
    fn completion() {
        let mut testbed = Testbed::new(Duration::from_secs(0));
        let handle = testbed.create("a", 3);

        let records = Arc::new(Mutex::new(Vec::new()));
        let tx = records.clone();
        assert!(testbed
            .pool
            .on_finish(handle, Box::new(move |v: Option<u32>| tx.lock().unwrap().push(v)))
            .is_none());

        let mut progress = vec![testbed.pool.progress(handle)];
        for _ in 0..5 {
            testbed.tick();
            progress.push(testbed.pool.progress(handle));
        }

        assert!(progress.windows(2).all(|v| v[0] <= v[1]));
        assert_eq!(*records.lock().unwrap(), vec![Some(3)]);
        assert_eq!(testbed.pool.result(handle), Some(3));
        assert!(testbed.pool.is_finished(handle));
    }

    #[test]
    fn release_now() {
        let mut testbed = Testbed::new(Duration::from_secs(60));
        let handle = testbed.create("a", 3);
        testbed.create("a", 3);

        testbed.pool.release_now(handle);
        assert!(testbed.pool.contains(handle));

        testbed.pool.release_now(handle);
        assert!(!testbed.pool.contains(handle));

        testbed.pool.release_now(handle);
        testbed.pool.release(handle);
        assert_eq!(*testbed.disposes.lock().unwrap(), vec![false]);
        assert!(testbed.pool.is_empty());

        let renewed = testbed.create("a", 3);
        assert_ne!(renewed, handle);
    }

    #[test]
    fn delayed_release() {
        let mut testbed = Testbed::new(Duration::from_secs(60));
        let handle = testbed.create("a", 1);

        testbed.pool.release(handle);
        testbed.tick();
        assert!(testbed.pool.contains(handle));
        assert!(testbed.pool.is_finished(handle));

        let revived = testbed.create("a", 1);
        assert_eq!(revived, handle);
        assert_eq!(testbed.pool.references(handle), 1);

        let mut testbed = Testbed::new(Duration::from_millis(1));
        let handle = testbed.create("a", 100);
        testbed.pool.release(handle);
        ::std::thread::sleep(Duration::from_millis(5));
        testbed.tick();
        assert!(!testbed.pool.contains(handle));
        assert_eq!(*testbed.disposes.lock().unwrap(), vec![false]);
    }

    #[test]
    fn disposed_never_completes() {
        let mut testbed = Testbed::new(Duration::from_secs(0));
        let handle = testbed.create("a", 2);

        let records = Arc::new(Mutex::new(Vec::new()));
        let tx = records.clone();
        testbed
            .pool
            .on_finish(handle, Box::new(move |v: Option<u32>| tx.lock().unwrap().push(v)));

        testbed.tick();
        testbed.pool.release(handle);
        for _ in 0..4 {
            assert_eq!(testbed.tick(), 0);
        }

        assert!(records.lock().unwrap().is_empty());
        assert!(testbed
            .pool
            .on_finish(handle, Box::new(|_: Option<u32>| panic!("stale")))
            .is_none());
    }

    #[test]
    fn finished_on_start() {
        let mut testbed = Testbed::new(Duration::from_secs(0));
        let handle = testbed.create("a", 0);
        assert!(testbed.pool.is_finished(handle));
        assert_eq!(testbed.pool.progress(handle), 1.0);

        let records = Arc::new(Mutex::new(Vec::new()));
        let tx = records.clone();
        testbed
            .pool
            .on_finish(handle, Box::new(move |v: Option<u32>| tx.lock().unwrap().push(v)))
            .unwrap()
            .fire();
        assert_eq!(*records.lock().unwrap(), vec![Some(0)]);
    }

    #[test]
    fn teardown() {
        let mut testbed = Testbed::new(Duration::from_secs(0));
        testbed.create("a", 2);
        testbed.create("b", 2);

        testbed.pool.teardown();
        assert!(testbed.pool.is_empty());
        assert_eq!(*testbed.disposes.lock().unwrap(), vec![true, true]);
    }
}
