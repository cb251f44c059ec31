use std::sync::{Arc, Mutex};

use crate::utils::prelude::ObjectPool;

impl_handle!(LifecycleListenerHandle);

pub trait LifecycleListener: Send {
    fn on_pre_update(&mut self) -> Result<(), failure::Error> {
        Ok(())
    }

    fn on_post_update(&mut self) -> Result<(), failure::Error> {
        Ok(())
    }

    fn on_exit(&mut self) -> Result<(), failure::Error> {
        Ok(())
    }
}

type Listener = Arc<Mutex<dyn LifecycleListener>>;

/// Drives the attached listeners once per tick.
#[derive(Default)]
pub struct LifecycleSystem {
    last_frame_lifecycles: Mutex<Vec<Listener>>,
    lifecycles: Mutex<ObjectPool<LifecycleListenerHandle, Listener>>,
}

impl LifecycleSystem {
    pub fn new() -> Self {
        LifecycleSystem {
            last_frame_lifecycles: Mutex::new(Vec::new()),
            lifecycles: Mutex::new(ObjectPool::new()),
        }
    }

    #[inline]
    pub fn attach<T>(&self, lis: T) -> LifecycleListenerHandle
    where
        T: LifecycleListener + 'static,
    {
        self.lifecycles
            .lock()
            .unwrap()
            .create(Arc::new(Mutex::new(lis)))
    }

    #[inline]
    pub fn detach(&self, handle: LifecycleListenerHandle) {
        self.lifecycles.lock().unwrap().free(handle);
    }

    /// Advances one tick.
    pub fn advance(&self) -> Result<(), failure::Error> {
        self.foreach(|v| v.on_pre_update())?;
        self.foreach(|v| v.on_post_update())
    }

    /// Notifies listeners that the host is shutting down, in reverse attaching order.
    pub fn exit(&self) -> Result<(), failure::Error> {
        self.foreach_rev(|v| v.on_exit())
    }

    fn foreach<T>(&self, func: T) -> Result<(), failure::Error>
    where
        T: Fn(&mut dyn LifecycleListener) -> Result<(), failure::Error>,
    {
        let mut last_frame_lifecycles = self.last_frame_lifecycles.lock().unwrap();

        {
            let lifecycles = self.lifecycles.lock().unwrap();
            last_frame_lifecycles
                .extend(lifecycles.keys().filter_map(|h| lifecycles.get(h).cloned()));
        }

        let result = last_frame_lifecycles
            .iter()
            .map(|v| func(&mut *v.lock().unwrap()))
            .collect::<Result<(), failure::Error>>();

        last_frame_lifecycles.clear();
        result
    }

    fn foreach_rev<T>(&self, func: T) -> Result<(), failure::Error>
    where
        T: Fn(&mut dyn LifecycleListener) -> Result<(), failure::Error>,
    {
        let mut last_frame_lifecycles = self.last_frame_lifecycles.lock().unwrap();

        {
            let lifecycles = self.lifecycles.lock().unwrap();
            let handles: Vec<_> = lifecycles.keys().collect();
            last_frame_lifecycles.extend(
                handles
                    .into_iter()
                    .rev()
                    .filter_map(|h| lifecycles.get(h).cloned()),
            );
        }

        let result = last_frame_lifecycles
            .iter()
            .map(|v| func(&mut *v.lock().unwrap()))
            .collect::<Result<(), failure::Error>>();

        last_frame_lifecycles.clear();
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(Arc<AtomicUsize>);

    impl LifecycleListener for Counter {
        fn on_post_update(&mut self) -> Result<(), failure::Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn attach_and_detach() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let lifecycle = LifecycleSystem::new();
        let handle = lifecycle.attach(Counter(ticks.clone()));

        lifecycle.advance().unwrap();
        lifecycle.advance().unwrap();
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        lifecycle.detach(handle);
        lifecycle.advance().unwrap();
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
