use super::handle::HandleLike;
use super::handle_pool::HandlePool;

/// A named object collections. Every time u create or free a handle, a
/// attached instance `T` will be created/ freed.
pub struct ObjectPool<H: HandleLike, T: Sized> {
    handles: HandlePool<H>,
    entries: Vec<Option<T>>,
}

impl<H: HandleLike, T: Sized> Default for ObjectPool<H, T> {
    fn default() -> Self {
        ObjectPool::new()
    }
}

impl<H: HandleLike, T: Sized> ObjectPool<H, T> {
    pub fn new() -> Self {
        ObjectPool {
            handles: HandlePool::new(),
            entries: Vec::new(),
        }
    }

    /// Creates a `T` and named it with `Handle`.
    pub fn create(&mut self, value: T) -> H {
        let handle = self.handles.create();
        let index = handle.index() as usize;

        if index >= self.entries.len() {
            self.entries.push(Some(value));
        } else {
            self.entries[index] = Some(value);
        }

        handle
    }

    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        if self.handles.is_alive(handle) {
            self.entries[handle.index() as usize].as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if self.handles.is_alive(handle) {
            self.entries[handle.index() as usize].as_mut()
        } else {
            None
        }
    }

    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        self.handles.is_alive(handle)
    }

    /// Recycles the value with name `Handle`.
    pub fn free(&mut self, handle: H) -> Option<T> {
        if self.handles.free(handle) {
            self.entries[handle.index() as usize].take()
        } else {
            None
        }
    }

    /// Returns handles of all the alive objects.
    pub fn keys<'a>(&'a self) -> impl Iterator<Item = H> + 'a {
        self.handles.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::handle::Handle;

    #[test]
    fn basic() {
        let mut set: ObjectPool<Handle, String> = ObjectPool::new();

        let e1 = set.create("a".to_owned());
        assert_eq!(set.get(e1).map(|v| v.as_str()), Some("a"));
        assert_eq!(set.len(), 1);

        set.get_mut(e1).unwrap().push('b');
        assert_eq!(set.free(e1), Some("ab".to_owned()));
        assert_eq!(set.free(e1), None);
        assert!(set.get(e1).is_none());
        assert!(set.is_empty());

        let e2 = set.create("c".to_owned());
        assert!(!set.contains(e1));
        assert_eq!(set.keys().collect::<Vec<_>>(), vec![e2]);
    }
}
