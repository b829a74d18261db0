//! Fixed-capacity collection keeping the `N` largest-key entries seen

/// Entries sorted by key, largest first. Ties keep insertion order.
/// Storage is inline, with no heap allocation.
#[derive(Debug, Clone)]
pub struct BestN<const N: usize, T> {
    /// `entries[..len]` are `Some`, the rest `None`
    entries: [Option<(f32, T)>; N],
    len: usize,
}

impl<const N: usize, T> Default for BestN<N, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, T> BestN<N, T> {
    pub fn new() -> Self {
        assert!(N > 0, "BestN capacity must be non-zero");
        Self {
            entries: std::array::from_fn(|_| None),
            len: 0,
        }
    }

    /// Offer an entry. Returns false if it was discarded because the list is
    /// full and `key` does not beat the current minimum.
    pub fn update(&mut self, key: f32, val: T) -> bool {
        let pos = self
            .iter()
            .position(|(k, _)| key > *k)
            .unwrap_or(self.len);
        if pos == N {
            return false;
        }
        if !self.is_full() {
            self.len += 1;
        }
        // The last slot (empty, or the evicted minimum) rotates into `pos`
        self.entries[pos..self.len].rotate_right(1);
        self.entries[pos] = Some((key, val));
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = f32> + '_ {
        self.iter().map(|(k, _)| *k)
    }

    /// Entries largest key first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &(f32, T)> {
        self.entries[..self.len].iter().flatten()
    }
}
