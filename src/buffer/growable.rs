//! The growable JSON buffer lent out by the pool.

use std::fmt;
use std::io;

use bytes::Bytes;
use serde::Serialize;

use super::stream::{STREAM_SEGMENT_SIZE, SegmentedStream};
use crate::config::DEFAULT_STREAM_THRESHOLD;
use crate::error::PoolError;
use crate::pool::{PoolKey, normalize_capacity};

/// Storage representation of a [`GrowableBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferMode {
    /// Contiguous in-memory accumulator.
    Inline,
    /// Segmented stream accumulator.
    Stream,
}

impl BufferMode {
    /// Returns the mode a buffer of `capacity` starts in.
    pub fn for_capacity(capacity: usize, stream_threshold: usize) -> Self {
        if capacity >= stream_threshold {
            BufferMode::Stream
        } else {
            BufferMode::Inline
        }
    }
}

enum Representation {
    Inline(Vec<u8>),
    Streamed(SegmentedStream),
}

impl Representation {
    fn new(mode: BufferMode, capacity: usize) -> Self {
        match mode {
            // The nominal capacity may be far beyond what will ever be written.
            BufferMode::Inline => {
                Representation::Inline(Vec::with_capacity(capacity.min(STREAM_SEGMENT_SIZE)))
            }
            BufferMode::Stream => Representation::Streamed(SegmentedStream::new(capacity)),
        }
    }

    fn mode(&self) -> BufferMode {
        match self {
            Representation::Inline(_) => BufferMode::Inline,
            Representation::Streamed(_) => BufferMode::Stream,
        }
    }
}

/// A single-owner, appendable JSON byte buffer.
///
/// Buffers below the stream threshold accumulate into one contiguous
/// allocation. Once the content would reach the threshold the buffer is
/// promoted, once per use, to a segmented stream that grows without copying
/// what was already written. Appends never fail for size reasons; the
/// nominal capacity only picks the size class and the starting mode.
///
/// # Example
///
/// ```
/// use jsonpool::{BufferMode, GrowableBuffer};
///
/// let mut buf = GrowableBuffer::with_stream_threshold(64, 128);
/// assert_eq!(buf.mode(), BufferMode::Inline);
///
/// buf.append("[");
/// buf.append_json(&vec!["a"; 40])?;
/// buf.append("]");
///
/// assert_eq!(buf.mode(), BufferMode::Stream);
/// assert!(buf.finalize().starts_with("[[\"a\",\"a\""));
///
/// buf.reset();
/// assert_eq!(buf.mode(), BufferMode::Inline);
/// assert!(buf.is_empty());
/// # Ok::<(), jsonpool::PoolError>(())
/// ```
pub struct GrowableBuffer {
    repr: Representation,
    nominal: usize,
    capacity: usize,
    size: usize,
    stream_threshold: usize,
    id: u64,
}

impl GrowableBuffer {
    /// Creates a buffer using the default stream threshold.
    ///
    /// `capacity` is rounded up to its size class.
    pub fn new(capacity: usize) -> Self {
        Self::with_stream_threshold(capacity, DEFAULT_STREAM_THRESHOLD)
    }

    /// Creates a buffer that promotes to a stream at `stream_threshold` bytes.
    pub fn with_stream_threshold(capacity: usize, stream_threshold: usize) -> Self {
        let nominal = normalize_capacity(capacity);
        let mode = BufferMode::for_capacity(nominal, stream_threshold);
        Self {
            repr: Representation::new(mode, nominal),
            nominal,
            capacity: nominal,
            size: 0,
            stream_threshold,
            id: 0,
        }
    }

    pub(crate) fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Returns the identifier assigned by the pool that allocated this
    /// buffer (0 for buffers created directly).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Appends raw JSON text verbatim.
    ///
    /// The caller is responsible for the text forming valid JSON together
    /// with the rest of the content.
    pub fn append(&mut self, text: &str) {
        self.push_bytes(text.as_bytes());
    }

    /// Serializes `value` into the buffer.
    ///
    /// Slashes and non-ASCII characters are written unescaped.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Encoding`] if `value` cannot be serialized. The
    /// buffer content and mode are rolled back to what they were before the
    /// call.
    pub fn append_json<T>(&mut self, value: &T) -> Result<(), PoolError>
    where
        T: Serialize + ?Sized,
    {
        let mark = self.size;
        let was_inline = self.mode() == BufferMode::Inline;
        let result = serde_json::to_writer(Sink { buffer: self }, value);
        if let Err(e) = result {
            self.rollback(mark);
            if was_inline && mark < self.stream_threshold {
                self.demote();
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Returns the accumulated content as a string.
    ///
    /// Reading does not consume anything: repeated calls without an
    /// intervening mutation return identical output.
    pub fn finalize(&self) -> String {
        // Content only ever enters through `&str` or serde_json, both UTF-8.
        match &self.repr {
            Representation::Inline(data) => String::from_utf8_lossy(data).into_owned(),
            Representation::Streamed(stream) => {
                String::from_utf8_lossy(&stream.to_bytes()).into_owned()
            }
        }
    }

    /// Returns the accumulated content as bytes.
    ///
    /// Streams that hold a single frozen segment are returned without copying.
    pub fn finalize_bytes(&self) -> Bytes {
        match &self.repr {
            Representation::Inline(data) => Bytes::copy_from_slice(data),
            Representation::Streamed(stream) => stream.to_bytes(),
        }
    }

    /// Clears the content and restores the mode and capacity this buffer
    /// had when it was constructed.
    ///
    /// A small buffer that was promoted to a stream goes back to inline;
    /// the promotion is not remembered across uses.
    pub fn reset(&mut self) {
        self.reset_with_threshold(self.stream_threshold);
    }

    /// Resets the buffer and adopts a new stream threshold.
    pub(crate) fn reset_with_threshold(&mut self, stream_threshold: usize) {
        self.stream_threshold = stream_threshold;
        self.size = 0;
        self.capacity = self.nominal;

        let mode = BufferMode::for_capacity(self.nominal, self.stream_threshold);
        match (&mut self.repr, mode) {
            (Representation::Inline(data), BufferMode::Inline) => data.clear(),
            (Representation::Streamed(stream), BufferMode::Stream) => stream.clear(),
            _ => self.repr = Representation::new(mode, self.nominal),
        }
    }

    /// Returns true if `bytes` more fit without exceeding the capacity.
    pub fn has_space(&self, bytes: usize) -> bool {
        self.size.saturating_add(bytes) <= self.capacity
    }

    /// Returns the bytes left before the capacity is reached.
    pub fn remaining_space(&self) -> usize {
        self.capacity.saturating_sub(self.size)
    }

    /// Returns `size / capacity` as a percentage.
    pub fn utilization(&self) -> f64 {
        self.size as f64 / self.capacity as f64 * 100.0
    }

    /// Returns the current capacity, including any overshoot of the nominal
    /// capacity during this use.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the size-class capacity fixed at construction.
    pub fn nominal_capacity(&self) -> usize {
        self.nominal
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the current representation.
    pub fn mode(&self) -> BufferMode {
        self.repr.mode()
    }

    /// Returns the stream threshold this buffer was created with.
    pub fn stream_threshold(&self) -> usize {
        self.stream_threshold
    }

    /// Returns the pool queue this buffer belongs to. Fixed at construction.
    pub fn pool_key(&self) -> PoolKey {
        PoolKey::for_normalized(self.nominal)
    }

    fn push_bytes(&mut self, data: &[u8]) {
        let total = self.size + data.len();
        if total >= self.stream_threshold {
            self.promote();
        }

        match &mut self.repr {
            Representation::Inline(buf) => buf.extend_from_slice(data),
            Representation::Streamed(stream) => stream.write(data),
        }

        self.size = total;
        if self.size > self.capacity {
            self.capacity = self.size;
        }
    }

    /// Moves inline content into a fresh stream. No-op once streamed.
    fn promote(&mut self) {
        if let Representation::Inline(data) = &self.repr {
            tracing::debug!(
                size = self.size,
                capacity = self.nominal,
                threshold = self.stream_threshold,
                "promoting buffer to stream"
            );
            let mut stream = SegmentedStream::new(self.nominal.max(data.len()));
            stream.write(data);
            self.repr = Representation::Streamed(stream);
        }
    }

    /// Undoes a promotion, moving streamed content back inline.
    fn demote(&mut self) {
        if let Representation::Streamed(stream) = &self.repr {
            let mut data = Vec::with_capacity(self.nominal.min(STREAM_SEGMENT_SIZE).max(self.size));
            data.extend_from_slice(&stream.to_bytes());
            self.repr = Representation::Inline(data);
        }
    }

    fn rollback(&mut self, mark: usize) {
        match &mut self.repr {
            Representation::Inline(data) => data.truncate(mark),
            Representation::Streamed(stream) => stream.truncate(mark),
        }
        self.size = mark;
    }
}

impl fmt::Debug for GrowableBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("id", &self.id)
            .field("mode", &self.mode())
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .field("nominal", &self.nominal)
            .finish()
    }
}

/// `io::Write` adapter so serde_json streams straight into the buffer.
struct Sink<'a> {
    buffer: &'a mut GrowableBuffer,
}

impl io::Write for Sink<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buffer.push_bytes(data);
        Ok(data.len())
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.buffer.push_bytes(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
