use std::marker::PhantomData;

use super::handle::{HandleIndex, HandleLike};

/// `HandlePool` hands out handles with recycled indices. A slot is alive while its
/// version is odd; freeing bumps the version to an even number, and the next `create`
/// on that slot bumps it to a fresh odd one.
pub struct HandlePool<H: HandleLike> {
    versions: Vec<HandleIndex>,
    frees: Vec<HandleIndex>,
    _phantom: PhantomData<H>,
}

impl<H: HandleLike> Default for HandlePool<H> {
    fn default() -> Self {
        HandlePool::new()
    }
}

impl<H: HandleLike> HandlePool<H> {
    pub fn new() -> Self {
        HandlePool {
            versions: Vec::new(),
            frees: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Creates a unused handle.
    pub fn create(&mut self) -> H {
        if let Some(index) = self.frees.pop() {
            let version = &mut self.versions[index as usize];
            *version += 1;
            H::new(index, *version)
        } else {
            self.versions.push(1);
            H::new(self.versions.len() as HandleIndex - 1, 1)
        }
    }

    /// Returns true if `handle` was created by this pool and has not been freed yet.
    #[inline]
    pub fn is_alive(&self, handle: H) -> bool {
        self.versions
            .get(handle.index() as usize)
            .map(|&v| v & 0x1 == 1 && v == handle.version())
            .unwrap_or(false)
    }

    /// Recycles the index of `handle`. Returns false if it is not alive.
    pub fn free(&mut self, handle: H) -> bool {
        if !self.is_alive(handle) {
            return false;
        }

        self.versions[handle.index() as usize] += 1;
        self.frees.push(handle.index());
        true
    }

    /// Returns the number of alive handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len() - self.frees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over all the alive handles.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = H> + 'a {
        self.versions
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v & 0x1 == 1)
            .map(|(i, &v)| H::new(i as HandleIndex, v))
    }
}
