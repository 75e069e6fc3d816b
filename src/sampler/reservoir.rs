//! Algorithm R reservoir.
//!
//! The first `capacity` items fill the reservoir. The k-th item after that
//! draws a slot uniformly from `0..k` and replaces it when the slot is inside
//! the reservoir, so it survives with probability `capacity / k`.

use rand::RngExt;

/// Fixed-capacity uniform sample over a stream of unknown length.
#[derive(Debug, Clone)]
pub struct Reservoir<T> {
    capacity: usize,
    items: Vec<T>,
    seen: u64,
}

impl<T> Reservoir<T> {
    /// A reservoir keeping at most `capacity` items. Zero keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, items: Vec::new(), seen: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items offered so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Offer one item, drawing from the thread-local RNG. Prefer
    /// [`offer_with_rng`](Self::offer_with_rng) in loops.
    pub fn offer(&mut self, item: T) {
        let mut rng = rand::rng();
        self.offer_with_rng(item, &mut rng);
    }

    /// Offer one item, drawing from `rng`.
    pub fn offer_with_rng<R: RngExt + ?Sized>(&mut self, item: T, rng: &mut R) {
        self.seen += 1;

        if self.items.len() < self.capacity {
            self.items.push(item);
            return;
        }

        let slot = rng.random_range(0..self.seen);
        if slot < self.capacity as u64 {
            self.items[slot as usize] = item;
        }
    }
}

impl<T> Extend<T> for Reservoir<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        let mut rng = rand::rng();
        for item in items {
            self.offer_with_rng(item, &mut rng);
        }
    }
}
