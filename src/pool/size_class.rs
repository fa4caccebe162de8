//! Power-of-two size classes.

use std::fmt;

/// Rounds `capacity` up to its size class.
///
/// Returns 1 for 0 and 1, otherwise the next power of two. Requests above
/// the largest representable power of two saturate at it.
///
/// ```
/// use jsonpool::normalize_capacity;
///
/// assert_eq!(normalize_capacity(0), 1);
/// assert_eq!(normalize_capacity(900), 1024);
/// assert_eq!(normalize_capacity(1024), 1024);
/// assert_eq!(normalize_capacity(1025), 2048);
/// ```
pub fn normalize_capacity(capacity: usize) -> usize {
    capacity
        .max(1)
        .checked_next_power_of_two()
        .unwrap_or(1 << (usize::BITS - 1))
}

/// Identifies the idle queue for one size class.
///
/// Equal normalized capacities always map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolKey(usize);

impl PoolKey {
    /// Returns the key for a requested capacity.
    pub fn for_capacity(capacity: usize) -> Self {
        Self(normalize_capacity(capacity))
    }

    pub(crate) fn for_normalized(capacity: usize) -> Self {
        debug_assert_eq!(capacity, normalize_capacity(capacity));
        Self(capacity)
    }

    /// Returns the normalized capacity of this class.
    pub fn capacity(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool_{}", self.0)
    }
}

/// Formats a byte count for statistics, e.g. `4.0KB (4096 bytes)`.
pub fn format_capacity(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;

    if bytes >= MIB {
        format!("{:.1}MB ({} bytes)", bytes as f64 / MIB as f64, bytes)
    } else if bytes >= KIB {
        format!("{:.1}KB ({} bytes)", bytes as f64 / KIB as f64, bytes)
    } else {
        format!("{}B ({} bytes)", bytes, bytes)
    }
}
