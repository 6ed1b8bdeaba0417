/// Growable circular byte FIFO.
///
/// Decouples the cadence of the audio thread from the cadence of whatever
/// consumes the bytes (file writes, codec pulls). The backing allocation grows
/// to the largest size ever demanded and is never shrunk.
///
/// Not synchronized; wrap in `parking_lot::Mutex` for cross-thread access.
#[derive(Debug, Default)]
pub struct RingBuffer {
    buffer: Vec<u8>,
    start: usize,
    size: usize,
}

impl RingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            start: 0,
            size: 0,
        }
    }

    /// Append `data` at the back, growing the allocation if needed.
    pub fn push_back(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        self.reserve(self.size + data.len());

        let capacity = self.buffer.len();
        let write_index = (self.start + self.size) % capacity;
        let first = data.len().min(capacity - write_index);
        self.buffer[write_index..write_index + first].copy_from_slice(&data[..first]);
        self.buffer[..data.len() - first].copy_from_slice(&data[first..]);
        self.size += data.len();
    }

    /// Remove the first `out.len()` bytes into `out`.
    ///
    /// Never removes more than [`size`](Self::size) bytes; returns how many
    /// bytes were actually copied.
    pub fn pop_front(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.size);
        if count == 0 {
            return 0;
        }

        let capacity = self.buffer.len();
        let first = count.min(capacity - self.start);
        out[..first].copy_from_slice(&self.buffer[self.start..self.start + first]);
        out[first..count].copy_from_slice(&self.buffer[..count - first]);

        self.start = (self.start + count) % capacity;
        self.size -= count;
        if self.size == 0 {
            self.start = 0;
        }
        count
    }

    /// Make at least `len` bytes addressable as one contiguous region at the
    /// front, for in-place writes by a consumer.
    ///
    /// Grows `size` to `len` when smaller (the new tail is zeroed); unread
    /// bytes already in the buffer stay at the front.
    pub fn upsize(&mut self, len: usize) {
        if self.size < len {
            self.reserve(len);
            let capacity = self.buffer.len();
            for i in self.size..len {
                self.buffer[(self.start + i) % capacity] = 0;
            }
            self.size = len;
        }
        self.make_contiguous();
    }

    /// Contiguous view of the first `len` readable bytes (clamped to `size`).
    pub fn front_mut(&mut self, len: usize) -> &mut [u8] {
        self.make_contiguous();
        let len = len.min(self.size);
        &mut self.buffer[self.start..self.start + len]
    }

    /// Number of bytes available to read.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Size of the backing allocation.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Drop all readable bytes, keeping the allocation.
    pub fn reset(&mut self) {
        self.start = 0;
        self.size = 0;
    }

    fn reserve(&mut self, needed: usize) {
        let capacity = self.buffer.len();
        if needed <= capacity {
            return;
        }

        let mut grown = vec![0u8; needed.max(capacity * 2)];
        let tail = self.size.min(capacity - self.start);
        grown[..tail].copy_from_slice(&self.buffer[self.start..self.start + tail]);
        grown[tail..self.size].copy_from_slice(&self.buffer[..self.size - tail]);
        self.buffer = grown;
        self.start = 0;
    }

    fn make_contiguous(&mut self) {
        if self.start + self.size > self.buffer.len() {
            self.buffer.rotate_left(self.start);
            self.start = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pop(buf: &mut RingBuffer, count: usize) -> Vec<u8> {
        let mut out = vec![0u8; count];
        let n = buf.pop_front(&mut out);
        out.truncate(n);
        out
    }

    #[test]
    fn basic_push_pop() {
        let mut buf = RingBuffer::new();
        buf.push_back(&[1, 2, 3]);

        assert_eq!(buf.size(), 3);
        assert_eq!(pop(&mut buf, 3), vec![1, 2, 3]);
        assert!(buf.is_empty());
    }

    #[test]
    fn pop_partial() {
        let mut buf = RingBuffer::new();
        buf.push_back(&[1, 2, 3, 4, 5]);

        assert_eq!(pop(&mut buf, 3), vec![1, 2, 3]);
        assert_eq!(buf.size(), 2);

        // Asking for more than is available only yields what is there.
        assert_eq!(pop(&mut buf, 10), vec![4, 5]);
        assert!(buf.is_empty());
    }

    #[test]
    fn grows_instead_of_dropping() {
        let mut buf = RingBuffer::with_capacity(4);
        buf.push_back(&[1, 2, 3, 4]);
        buf.push_back(&[5, 6]);

        assert_eq!(buf.size(), 6);
        assert!(buf.capacity() >= 6);
        assert_eq!(pop(&mut buf, 6), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn wraparound_then_grow_keeps_order() {
        let mut buf = RingBuffer::with_capacity(4);
        buf.push_back(&[1, 2, 3]);
        pop(&mut buf, 2);

        buf.push_back(&[4, 5]); // wraps around the end of the allocation
        assert_eq!(buf.capacity(), 4);

        buf.push_back(&[6, 7, 8]); // forces a grow while wrapped
        assert_eq!(pop(&mut buf, 6), vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn capacity_never_shrinks() {
        let mut buf = RingBuffer::new();
        buf.push_back(&[0u8; 100]);
        let grown = buf.capacity();

        pop(&mut buf, 100);
        buf.reset();
        buf.push_back(&[1]);

        assert_eq!(buf.capacity(), grown);
    }

    #[test]
    fn upsize_preserves_unread_front() {
        let mut buf = RingBuffer::with_capacity(4);
        buf.push_back(&[1, 2, 3]);
        pop(&mut buf, 2);
        buf.push_back(&[4, 5]); // wrapped: [3, 4, 5]

        buf.upsize(6);

        assert_eq!(buf.size(), 6);
        assert_eq!(buf.front_mut(6), &[3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn upsize_smaller_is_noop_on_size() {
        let mut buf = RingBuffer::new();
        buf.upsize(16);
        buf.upsize(8);

        assert_eq!(buf.size(), 16);
        assert_eq!(buf.front_mut(8).len(), 8);
    }

    #[test]
    fn front_mut_writes_in_place() {
        let mut buf = RingBuffer::new();
        buf.upsize(4);
        buf.front_mut(4).copy_from_slice(&[9, 8, 7, 6]);

        assert_eq!(pop(&mut buf, 4), vec![9, 8, 7, 6]);
    }

    #[test]
    fn empty_operations() {
        let mut buf = RingBuffer::new();

        assert!(buf.is_empty());
        assert!(pop(&mut buf, 5).is_empty());
        assert!(buf.front_mut(5).is_empty());

        buf.push_back(&[]);
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 0);
    }
}
