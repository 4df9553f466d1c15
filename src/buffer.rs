use crate::constants;
use crate::source::ByteSource;
use memchr::memmem;

/// A fixed-capacity window over the body with explicit `position`/`limit`
/// markers.
///
/// `0 <= position <= limit <= capacity` always holds. Bytes in
/// `[position, limit)` are read but not yet consumed.
pub(crate) struct WorkBuffer {
    buf: Box<[u8]>,
    position: usize,
    limit: usize,
    eof: bool,
    whole_stream_size_limit: u64,
    stream_size_counter: u64,
}

/// Outcome of scanning a part body for the next delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyScan {
    /// The delimiter starts at this absolute index; everything before it
    /// belongs to the part.
    Delimiter(usize),
    /// No delimiter yet; bytes up to this absolute index are provably part of
    /// the body and the rest might be the start of a delimiter.
    Partial(usize),
}

impl WorkBuffer {
    pub fn new(capacity: usize, whole_stream_size_limit: u64) -> Self {
        WorkBuffer {
            buf: vec![0; capacity].into_boxed_slice(),
            position: 0,
            limit: 0,
            eof: false,
            whole_stream_size_limit,
            stream_size_counter: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn is_full(&self) -> bool {
        self.position == 0 && self.limit == self.capacity()
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn unconsumed(&self) -> &[u8] {
        &self.buf[self.position..self.limit]
    }

    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.buf[start..end]
    }

    pub fn set_position(&mut self, position: usize) {
        debug_assert!(position <= self.limit);
        self.position = position;
    }

    pub fn advance(&mut self, count: usize) {
        self.set_position(self.position + count);
    }

    /// Slides `[position, limit)` down to offset 0.
    pub fn compact(&mut self) {
        if self.position == 0 {
            return;
        }

        self.buf.copy_within(self.position..self.limit, 0);
        self.limit -= self.position;
        self.position = 0;
    }

    /// Grows the window to `capacity` bytes, keeping every unconsumed byte.
    pub fn grow(&mut self, capacity: usize) {
        if capacity <= self.capacity() {
            return;
        }

        self.compact();
        let mut buf = vec![0; capacity].into_boxed_slice();
        buf[..self.limit].copy_from_slice(&self.buf[..self.limit]);
        self.buf = buf;
    }

    /// Compacts the window and reads more bytes into `[limit, capacity)`.
    ///
    /// Reads once, or until the window is full or the source is exhausted when
    /// `wait_until_full_or_eof` is set. Returns the number of bytes newly read,
    /// which is 0 only at end of stream or when the window is already full.
    pub fn refill<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        wait_until_full_or_eof: bool,
    ) -> crate::Result<usize> {
        self.compact();

        let mut total = 0;

        while !self.eof && self.limit < self.capacity() {
            let read = source
                .read_into(&mut self.buf[self.limit..])
                .map_err(|err| crate::Error::StreamReadFailed(err.into()))?;

            if read == 0 {
                self.eof = true;
                break;
            }

            self.limit += read;
            total += read;

            self.stream_size_counter += read as u64;
            if self.stream_size_counter > self.whole_stream_size_limit {
                return Err(crate::Error::StreamSizeExceeded {
                    limit: self.whole_stream_size_limit,
                });
            }

            if !wait_until_full_or_eof {
                break;
            }
        }

        log::trace!("refilled {} bytes, window holds {}", total, self.limit);

        Ok(total)
    }

    /// Finds `pattern` within the unconsumed bytes, returning its absolute index.
    pub fn find(&self, pattern: &[u8]) -> Option<usize> {
        find(&self.buf, pattern, self.position, self.limit)
    }

    /// Scans the unconsumed bytes for `delimiter`, the `CRLF--boundary`
    /// sequence that ends a part body.
    pub fn scan_body(&self, delimiter: &[u8]) -> BodyScan {
        if let Some(idx) = self.find(delimiter) {
            return BodyScan::Delimiter(idx);
        }

        // Only the last `delimiter.len() - 1` bytes can hold an incomplete
        // delimiter, and such a prefix always starts with CR.
        let tail_start = self.position.max(self.limit.saturating_sub(delimiter.len() - 1));
        let tail = &self.buf[tail_start..self.limit];

        let keep_from = memchr::memchr_iter(constants::CR, tail)
            .map(|rel_idx| tail_start + rel_idx)
            .find(|&idx| delimiter.starts_with(&self.buf[idx..self.limit]))
            .unwrap_or(self.limit);

        BodyScan::Partial(keep_from)
    }
}

/// Byte-exact search for `pattern` within `buf[from..to)`.
pub(crate) fn find(buf: &[u8], pattern: &[u8], from: usize, to: usize) -> Option<usize> {
    memmem::find(&buf[from..to], pattern).map(|idx| idx + from)
}
