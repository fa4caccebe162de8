//! Configuration for pool behavior.
//!
//! - [`PoolConfig`] - Default capacity, per-class population cap, stream threshold
//! - [`SizeCategories`] - Named capacity buckets, always sorted ascending
//! - [`PoolConfigPatch`] - Partial update merged into a [`PoolConfig`]
//!
//! # Example
//!
//! ```
//! use jsonpool::{PoolConfig, PoolConfigPatch};
//!
//! let mut config = PoolConfig::default();
//! config.apply(
//!     PoolConfigPatch::new()
//!         .with_max_pool_size(8)
//!         .with_category("huge", 1 << 20),
//! )?;
//!
//! assert_eq!(config.max_pool_size(), 8);
//! assert_eq!(config.size_categories().get("small"), Some(1024));
//! assert_eq!(config.size_categories().largest(), Some(1 << 20));
//! # Ok::<(), jsonpool::PoolError>(())
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::PoolError;

/// Default capacity lent when the caller does not ask for one (4 KiB).
pub const DEFAULT_CAPACITY: usize = 4 * 1024;

/// Default cap on idle buffers kept per size class.
pub const DEFAULT_MAX_POOL_SIZE: usize = 32;

/// Default size at which buffers switch to the stream representation (8 KiB).
pub const DEFAULT_STREAM_THRESHOLD: usize = 8 * 1024;

/// Built-in size categories.
pub const DEFAULT_SIZE_CATEGORIES: [(&str, usize); 4] = [
    ("small", 1024),
    ("medium", 4 * 1024),
    ("large", 16 * 1024),
    ("xlarge", 64 * 1024),
];

/// Ordered label to byte-threshold table.
///
/// Entries are kept sorted ascending by threshold (ties by label), so
/// iteration always walks from the smallest bucket to the largest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeCategories {
    entries: Vec<(String, usize)>,
}

impl SizeCategories {
    /// Creates an empty table.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds a table from `(label, bytes)` pairs. Later duplicates win.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut table = Self::empty();
        for (label, bytes) in pairs {
            table.upsert(label.into(), bytes);
        }
        table.sort();
        table
    }

    /// Returns the threshold of `label`, if present.
    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, bytes)| *bytes)
    }

    /// Iterates `(label, bytes)` in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.entries.iter().map(|(name, bytes)| (name.as_str(), *bytes))
    }

    /// Returns the number of categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no categories.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the smallest threshold that is `>= bytes`.
    pub fn smallest_at_least(&self, bytes: usize) -> Option<usize> {
        self.entries
            .iter()
            .map(|(_, threshold)| *threshold)
            .find(|threshold| *threshold >= bytes)
    }

    /// Returns the largest threshold.
    pub fn largest(&self) -> Option<usize> {
        self.entries.last().map(|(_, bytes)| *bytes)
    }

    /// Merges `other` key by key: unmentioned labels are kept, mentioned
    /// ones overwritten, new ones added. The table is re-sorted afterwards.
    pub fn merge(&mut self, other: &SizeCategories) {
        for (label, bytes) in &other.entries {
            self.upsert(label.clone(), *bytes);
        }
        self.sort();
    }

    fn upsert(&mut self, label: String, bytes: usize) {
        match self.entries.iter_mut().find(|(name, _)| *name == label) {
            Some(entry) => entry.1 = bytes,
            None => self.entries.push((label, bytes)),
        }
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    }

    fn validate(&self) -> Result<(), PoolError> {
        if self.is_empty() {
            return Err(PoolError::invalid_config("size categories cannot be empty"));
        }
        self.validate_values()
    }

    fn validate_values(&self) -> Result<(), PoolError> {
        match self.entries.iter().find(|(_, bytes)| *bytes == 0) {
            Some((label, _)) => Err(PoolError::invalid_config(format!(
                "size category `{}` must be a positive integer",
                label
            ))),
            None => Ok(()),
        }
    }
}

impl Default for SizeCategories {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_SIZE_CATEGORIES)
    }
}

impl Serialize for SizeCategories {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, bytes) in &self.entries {
            map.serialize_entry(label, bytes)?;
        }
        map.end()
    }
}

/// Configuration for a [`BufferPool`](crate::BufferPool).
///
/// Modified only through [`PoolConfig::apply`], which merges a
/// [`PoolConfigPatch`]; a full reset goes back to [`PoolConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    default_capacity: usize,
    max_pool_size: usize,
    stream_threshold: usize,
    size_categories: SizeCategories,
}

impl PoolConfig {
    /// Sets the default capacity.
    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Sets the idle-buffer cap per size class.
    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Sets the stream threshold.
    pub fn with_stream_threshold(mut self, threshold: usize) -> Self {
        self.stream_threshold = threshold;
        self
    }

    /// Returns the default capacity.
    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }

    /// Returns the idle-buffer cap per size class.
    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }

    /// Returns the stream threshold.
    pub fn stream_threshold(&self) -> usize {
        self.stream_threshold
    }

    /// Returns the size category table.
    pub fn size_categories(&self) -> &SizeCategories {
        &self.size_categories
    }

    /// Merges `patch` into this configuration.
    ///
    /// Scalars present in the patch replace the current values; categories
    /// are merged key by key. On error nothing is changed.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if a category is zero or the
    /// merged category table is empty.
    pub fn apply(&mut self, patch: PoolConfigPatch) -> Result<(), PoolError> {
        let mut categories = self.size_categories.clone();
        if let Some(update) = &patch.size_categories {
            update.validate_values()?;
            categories.merge(update);
        }
        categories.validate()?;

        if let Some(capacity) = patch.default_capacity {
            self.default_capacity = capacity;
        }
        if let Some(size) = patch.max_pool_size {
            self.max_pool_size = size;
        }
        if let Some(threshold) = patch.stream_threshold {
            self.stream_threshold = threshold;
        }
        self.size_categories = categories;
        Ok(())
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), PoolError> {
        self.size_categories.validate()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CAPACITY,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            stream_threshold: DEFAULT_STREAM_THRESHOLD,
            size_categories: SizeCategories::default(),
        }
    }
}

/// Partial configuration update.
///
/// # Example
///
/// ```
/// use jsonpool::PoolConfigPatch;
/// use serde_json::json;
///
/// let patch = PoolConfigPatch::from_json(&json!({
///     "streamThreshold": 16384,
///     "sizeCategories": { "tiny": 256 }
/// }))?;
/// assert_eq!(patch.stream_threshold(), Some(16384));
///
/// assert!(PoolConfigPatch::from_json(&json!({ "sizeCategories": { "bad": -1 } })).is_err());
/// # Ok::<(), jsonpool::PoolError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolConfigPatch {
    default_capacity: Option<usize>,
    max_pool_size: Option<usize>,
    stream_threshold: Option<usize>,
    size_categories: Option<SizeCategories>,
}

impl PoolConfigPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default capacity.
    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = Some(capacity);
        self
    }

    /// Replaces the idle-buffer cap per size class.
    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    /// Replaces the stream threshold.
    pub fn with_stream_threshold(mut self, threshold: usize) -> Self {
        self.stream_threshold = Some(threshold);
        self
    }

    /// Adds or overwrites one size category.
    pub fn with_category(mut self, label: impl Into<String>, bytes: usize) -> Self {
        let update = self.size_categories.get_or_insert_with(SizeCategories::empty);
        update.upsert(label.into(), bytes);
        update.sort();
        self
    }

    /// Returns the default capacity update, if any.
    pub fn default_capacity(&self) -> Option<usize> {
        self.default_capacity
    }

    /// Returns the max pool size update, if any.
    pub fn max_pool_size(&self) -> Option<usize> {
        self.max_pool_size
    }

    /// Returns the stream threshold update, if any.
    pub fn stream_threshold(&self) -> Option<usize> {
        self.stream_threshold
    }

    /// Returns the category updates, if any.
    pub fn size_categories(&self) -> Option<&SizeCategories> {
        self.size_categories.as_ref()
    }

    /// Parses a loosely typed patch object.
    ///
    /// Accepts `defaultCapacity`, `maxPoolSize`, `streamThreshold` and a
    /// `sizeCategories` object. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the input is not an object,
    /// a scalar is not a non-negative integer, or a category value is not a
    /// positive integer.
    pub fn from_json(value: &Value) -> Result<Self, PoolError> {
        let object = value
            .as_object()
            .ok_or_else(|| PoolError::invalid_config("configuration patch must be an object"))?;

        let mut patch = Self::new();
        patch.default_capacity = scalar(object.get("defaultCapacity"), "defaultCapacity")?;
        patch.max_pool_size = scalar(object.get("maxPoolSize"), "maxPoolSize")?;
        patch.stream_threshold = scalar(object.get("streamThreshold"), "streamThreshold")?;

        if let Some(categories) = object.get("sizeCategories") {
            let categories = categories.as_object().ok_or_else(|| {
                PoolError::invalid_config("sizeCategories must be an object")
            })?;
            let mut update = SizeCategories::empty();
            for (label, bytes) in categories {
                let bytes = bytes
                    .as_u64()
                    .filter(|bytes| *bytes > 0)
                    .and_then(|bytes| usize::try_from(bytes).ok())
                    .ok_or_else(|| {
                        PoolError::invalid_config(format!(
                            "size category `{}` must be a positive integer",
                            label
                        ))
                    })?;
                update.upsert(label.clone(), bytes);
            }
            update.sort();
            patch.size_categories = Some(update);
        }

        Ok(patch)
    }
}

fn scalar(value: Option<&Value>, name: &str) -> Result<Option<usize>, PoolError> {
    match value {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| {
                PoolError::invalid_config(format!("{} must be a non-negative integer", name))
            }),
    }
}
