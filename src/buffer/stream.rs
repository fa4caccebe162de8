//! Segmented byte stream backing large buffers.
//!
//! Content is written into a `BytesMut` tail. Once the tail fills a segment
//! it is frozen into an immutable `Bytes` and a fresh tail is started, so
//! growing the stream never copies bytes that were already written.

use bytes::{Bytes, BytesMut};

/// Size of a frozen stream segment (16 KiB).
pub(crate) const STREAM_SEGMENT_SIZE: usize = 16 * 1024;

#[derive(Debug)]
pub(crate) struct SegmentedStream {
    frozen: Vec<Bytes>,
    frozen_len: usize,
    tail: BytesMut,
}

impl SegmentedStream {
    /// Creates a stream whose first segment reserves `initial` bytes.
    pub(crate) fn new(initial: usize) -> Self {
        Self {
            frozen: Vec::new(),
            frozen_len: 0,
            tail: BytesMut::with_capacity(initial.min(STREAM_SEGMENT_SIZE)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.frozen_len + self.tail.len()
    }

    pub(crate) fn write(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let room = STREAM_SEGMENT_SIZE - self.tail.len();
            let take = room.min(data.len());
            self.tail.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.tail.len() == STREAM_SEGMENT_SIZE {
                let segment = self.tail.split().freeze();
                self.frozen_len += segment.len();
                self.frozen.push(segment);
            }
        }
    }

    /// Drops everything past `len` bytes.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        if len >= self.frozen_len {
            self.tail.truncate(len - self.frozen_len);
            return;
        }

        self.tail.clear();
        let mut remaining = len;
        let mut keep = 0;
        for segment in &mut self.frozen {
            if remaining == 0 {
                break;
            }
            if segment.len() > remaining {
                segment.truncate(remaining);
            }
            remaining -= segment.len();
            keep += 1;
        }
        self.frozen.truncate(keep);
        self.frozen_len = len;
    }

    /// Empties the stream, keeping the tail allocation.
    pub(crate) fn clear(&mut self) {
        self.frozen.clear();
        self.frozen_len = 0;
        self.tail.clear();
    }

    /// Returns the full content without consuming the stream.
    pub(crate) fn to_bytes(&self) -> Bytes {
        match (self.frozen.as_slice(), self.tail.is_empty()) {
            ([], _) => Bytes::copy_from_slice(&self.tail),
            ([only], true) => only.clone(),
            (segments, _) => {
                let mut out = BytesMut::with_capacity(self.len());
                for segment in segments {
                    out.extend_from_slice(segment);
                }
                out.extend_from_slice(&self.tail);
                out.freeze()
            }
        }
    }
}
