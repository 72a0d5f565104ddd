//! Message Accumulator: a bounded stack-resident byte area with overflow
//! spill, used by the transport to collect one inbound request until the
//! codec's completeness probe succeeds or a size limit is reached.
//!
//! Grounded in `include/shared/rpc/MessageStorage.h`: a fixed stack buffer
//! that is filled first, with an unbounded `String` taking the overflow once
//! the stack area is full. Unlike the original's `stored()` (which can
//! under-report once a flush has happened while unflushed bytes also sit in
//! the stack area), this implementation always reports the exact total —
//! see `DESIGN.md` for the rationale.

/// Default capacity of the stack-resident area: 32 KiB.
pub const DEFAULT_STACK_SIZE: usize = 32 * 1024;

/// A bounded byte accumulator: a fixed-capacity stack area filled first,
/// with an unbounded overflow string taking any bytes once the area is
/// full.
///
/// `N` is the stack area's capacity in bytes.
pub struct Accumulator<const N: usize = DEFAULT_STACK_SIZE> {
    area: Box<[u8; N]>,
    area_len: usize,
    overflow: String,
}

impl<const N: usize> Accumulator<N> {
    /// Creates a new, empty accumulator.
    pub fn new() -> Self {
        Self {
            area: Box::new([0u8; N]),
            area_len: 0,
            overflow: String::new(),
        }
    }

    /// Returns a mutable window of the still-writable part of the stack
    /// area. Empty once the area is full; callers should spill to
    /// `push_overflow` at that point.
    pub fn writable_area(&mut self) -> &mut [u8] {
        &mut self.area[self.area_len..]
    }

    /// Commits `n` bytes that were just written into the window returned by
    /// [`Self::writable_area`].
    ///
    /// # Panics
    ///
    /// Panics if `n` would overflow the remaining area capacity.
    pub fn commit(&mut self, n: usize) {
        assert!(self.area_len + n <= N, "commit exceeds stack area capacity");
        self.area_len += n;
    }

    /// Appends bytes directly to the overflow string. Used once the stack
    /// area is full. The bytes must be valid UTF-8 (true for anything the
    /// transport reads, since the wire protocol is textual JSON).
    pub fn push_overflow(&mut self, bytes: &[u8]) -> Result<(), std::str::Utf8Error> {
        self.overflow.push_str(std::str::from_utf8(bytes)?);
        Ok(())
    }

    /// Bytes still free in the stack area before overflow is needed.
    pub fn area_remaining(&self) -> usize {
        N - self.area_len
    }

    /// True once the stack area is full and any further bytes must go to
    /// overflow.
    pub fn area_is_full(&self) -> bool {
        self.area_len == N
    }

    /// True once both the stack area and the configured overflow budget are
    /// exhausted, i.e. no more bytes may be accepted.
    pub fn is_at_capacity(&self, max_total: usize) -> bool {
        self.stored() >= max_total
    }

    /// Total bytes committed so far: bytes in the stack area plus bytes in
    /// overflow.
    pub fn stored(&self) -> usize {
        self.area_len + self.overflow.len()
    }

    /// Finalises the accumulated bytes into a single `String`, joining
    /// overflow after the area. When everything fits in the stack area this
    /// is the only allocation performed (the overflow string is empty and
    /// contributes nothing to copy).
    ///
    /// Idempotent: may be called repeatedly without consuming the
    /// accumulator.
    pub fn finalize(&self) -> String {
        if self.overflow.is_empty() {
            // SAFETY-free path: the transport only ever commits bytes that came
            // from a UTF-8 text wire protocol (JSON/YAML-superset).
            String::from_utf8_lossy(&self.area[..self.area_len]).into_owned()
        } else {
            let mut joined = String::with_capacity(self.stored());
            joined.push_str(&String::from_utf8_lossy(&self.area[..self.area_len]));
            joined.push_str(&self.overflow);
            joined
        }
    }

    /// Resets the accumulator to empty, ready for the next request on the
    /// same connection slot.
    pub fn reset(&mut self) {
        self.area_len = 0;
        self.overflow.clear();
    }
}

impl<const N: usize> Default for Accumulator<N> {
    fn default() -> Self {
        Self::new()
    }
}
