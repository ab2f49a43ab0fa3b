//! Fixed-capacity circular buffer shared by the sample window and the two
//! FFT histories.
//!
//! Indexing mirrors the reference algorithm's modular arithmetic exactly:
//! `get(position + k)` for a negative `k` returns the `|k|`-th most
//! recently appended element, wrapping through slots that have not yet
//! been overwritten (which still hold their construction-time default).

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    /// Index the next `append` will write to.
    pub position: usize,
    /// Total number of elements ever appended (never wraps back to 0).
    pub num_written: u64,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize, default: T) -> Self {
        RingBuffer {
            data: vec![default; capacity],
            position: 0,
            num_written: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn append(&mut self, value: T) {
        let capacity = self.data.len();
        self.data[self.position] = value;
        self.position = (self.position + 1) % capacity;
        self.num_written += 1;
    }

    /// Resolve a (possibly negative) ring index to a slot index.
    fn wrap(&self, index: i64) -> usize {
        let capacity = self.data.len() as i64;
        (((index % capacity) + capacity) % capacity) as usize
    }

    pub fn get(&self, index: i64) -> &T {
        &self.data[self.wrap(index)]
    }

    pub fn get_mut(&mut self, index: i64) -> &mut T {
        let idx = self.wrap(index);
        &mut self.data[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_advances_position_and_counter() {
        let mut ring = RingBuffer::new(4, 0i32);
        ring.append(1);
        ring.append(2);
        assert_eq!(ring.position, 2);
        assert_eq!(ring.num_written, 2);
    }

    #[test]
    fn negative_offsets_read_most_recent_entries() {
        let mut ring = RingBuffer::new(4, 0i32);
        for v in [10, 20, 30, 40] {
            ring.append(v);
        }
        // position is now 0 (wrapped); the last-written value is at position - 1.
        assert_eq!(*ring.get(ring.position as i64 - 1), 40);
        assert_eq!(*ring.get(ring.position as i64 - 2), 30);
        assert_eq!(*ring.get(ring.position as i64 - 4), 40);
    }

    #[test]
    fn unwritten_slots_keep_their_default() {
        let ring: RingBuffer<i32> = RingBuffer::new(4, -1);
        assert_eq!(*ring.get(0), -1);
        assert_eq!(*ring.get(-1), -1);
    }

    #[test]
    fn vector_slots_own_independent_storage() {
        // A common pitfall: seeding every slot from one shared default and
        // then mutating in place corrupts every other untouched slot.
        let mut ring: RingBuffer<Vec<f32>> = RingBuffer::new(3, vec![0.0; 4]);
        ring.get_mut(0)[1] = 9.0;
        assert_eq!((*ring.get(1))[1], 0.0);
        assert_eq!((*ring.get(2))[1], 0.0);
    }

    #[test]
    fn positive_offsets_wrap_to_the_oldest_slot() {
        let mut ring = RingBuffer::new(4, 0i32);
        for v in [1, 2, 3, 4, 5] {
            ring.append(v);
        }
        // position == 1 now; position + 4 wraps back onto position itself.
        assert_eq!(*ring.get(ring.position as i64), *ring.get(ring.position as i64 + 4));
    }
}
