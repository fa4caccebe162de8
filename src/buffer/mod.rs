//! Growable JSON buffers.
//!
//! - [`GrowableBuffer`] - Appendable buffer lent out by the pool
//! - [`BufferMode`] - Inline or segmented-stream representation
//!
//! The segmented stream that backs large buffers is an implementation
//! detail and not part of the public API.

mod growable;
mod stream;

pub use growable::{BufferMode, GrowableBuffer};
