//! Payload size estimation.
//!
//! Maps the coarse shape of a value to a predicted JSON size, then to a
//! size category. The prediction is deliberately rough: buffers grow past
//! their capacity without failing, so an underestimate only costs a
//! reallocation, never correctness.
//!
//! # Example
//!
//! ```
//! use jsonpool::{Shape, SizeCategories, estimate, optimal_capacity};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     name: String,
//!     email: String,
//!     age: u32,
//! }
//!
//! let items = vec![1, 2, 3, 4, 5];
//! assert_eq!(estimate(&items), 512);
//! assert_eq!(optimal_capacity(&items, &SizeCategories::default()), 1024);
//!
//! let user = User { name: "ana".into(), email: "ana@example.com".into(), age: 31 };
//! assert_eq!(Shape::of(&user), Shape::Record(3));
//! assert_eq!(estimate(&user), 250);
//! ```

mod shape;

use serde::Serialize;

use crate::config::SizeCategories;
use crate::pool::normalize_capacity;

/// Coarse shape of a value, as far as size estimation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A string of the given byte length.
    Text(usize),
    /// A boolean.
    Bool,
    /// An absent value.
    Null,
    /// Any number.
    Number,
    /// An ordered sequence with the given element count.
    Sequence(usize),
    /// A keyed record with the given field count.
    Record(usize),
    /// Anything else.
    Opaque,
}

impl Shape {
    /// Reads the top-level shape of any serializable value.
    ///
    /// Only the outermost value is inspected. Sequences and records report
    /// their element or field count without serializing the elements. A
    /// value whose `Serialize` impl fails is [`Shape::Opaque`].
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Shape {
        shape::shape_of(value)
    }

    /// Returns the predicted JSON size in bytes.
    pub fn estimated_size(self) -> usize {
        match self {
            Shape::Text(len) => len.saturating_add(20),
            Shape::Bool | Shape::Null => 10,
            Shape::Number => 20,
            Shape::Sequence(0) => 2,
            Shape::Sequence(n) if n < 10 => 512,
            Shape::Sequence(n) if n < 100 => 2048,
            Shape::Sequence(n) if n < 1000 => 8192,
            Shape::Sequence(_) => 32768,
            Shape::Record(fields) => fields.saturating_mul(50).saturating_add(100),
            Shape::Opaque => 100,
        }
    }

    /// Returns the buffer capacity to request for a value of this shape.
    pub fn optimal_capacity(self, categories: &SizeCategories) -> usize {
        capacity_for_estimate(self.estimated_size(), categories)
    }
}

/// Returns the predicted JSON size of `value` in bytes.
pub fn estimate<T: Serialize + ?Sized>(value: &T) -> usize {
    Shape::of(value).estimated_size()
}

/// Returns the buffer capacity to request for `value`.
///
/// Picks the smallest category that fits the estimate. Estimates past the
/// largest category round up to the next power of two, never below that
/// largest category.
pub fn optimal_capacity<T: Serialize + ?Sized>(value: &T, categories: &SizeCategories) -> usize {
    Shape::of(value).optimal_capacity(categories)
}

pub(crate) fn capacity_for_estimate(estimate: usize, categories: &SizeCategories) -> usize {
    if let Some(category) = categories.smallest_at_least(estimate) {
        return category;
    }
    let rounded = normalize_capacity(estimate);
    match categories.largest() {
        Some(largest) => rounded.max(largest),
        None => rounded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

    #[derive(Serialize)]
    struct Point {
        x: f64,
        y: f64,
    }

    #[test]
    fn test_scalars() {
        assert_eq!(estimate("hello"), 25);
        assert_eq!(estimate(&String::new()), 20);
        assert_eq!(estimate(&true), 10);
        assert_eq!(estimate(&()), 10);
        assert_eq!(estimate(&None::<u32>), 10);
        assert_eq!(estimate(&42u64), 20);
        assert_eq!(estimate(&1.5f64), 20);
        assert_eq!(estimate(&Some("ab")), 22);
    }

    #[test]
    fn test_sequences() {
        assert_eq!(estimate(&Vec::<u8>::new()), 2);
        assert_eq!(estimate(&[1, 2, 3, 4, 5]), 512);
        assert_eq!(estimate(&vec![0; 9]), 512);
        assert_eq!(estimate(&vec![0; 10]), 2048);
        assert_eq!(estimate(&vec![0; 99]), 2048);
        assert_eq!(estimate(&vec![0; 100]), 8192);
        assert_eq!(estimate(&vec![0; 999]), 8192);
        assert_eq!(estimate(&vec![0; 1000]), 32768);
        assert_eq!(estimate(&vec![0u8; 3][..]), 512);
    }

    #[test]
    fn test_records() {
        assert_eq!(estimate(&HashMap::<String, u32>::new()), 100);
        let map: BTreeMap<_, _> = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(estimate(&map), 200);
        assert_eq!(estimate(&Point { x: 1.0, y: 2.0 }), 200);
        assert_eq!(Shape::Record(10).estimated_size(), 600);
        assert_eq!(Shape::Opaque.estimated_size(), 100);
    }

    #[test]
    fn test_std_collections() {
        let set: HashSet<u32> = (0..20).collect();
        assert_eq!(estimate(&set), 2048);
        let tree: BTreeSet<&str> = ["a"].into_iter().collect();
        assert_eq!(estimate(&tree), 512);
        let deque: VecDeque<u8> = VecDeque::new();
        assert_eq!(estimate(&deque), 2);
        assert_eq!(estimate(&("a", 1, true)), 512);
        assert_eq!(estimate(&Box::new(7u8)), 20);
    }

    #[test]
    fn test_json_values() {
        assert_eq!(estimate(&json!(null)), 10);
        assert_eq!(estimate(&json!(false)), 10);
        assert_eq!(estimate(&json!(3)), 20);
        assert_eq!(estimate(&json!("abc")), 23);
        assert_eq!(estimate(&json!([])), 2);
        assert_eq!(estimate(&json!([1, 2])), 512);
        assert_eq!(estimate(&json!({})), 100);
        assert_eq!(estimate(&json!({"a": 1, "b": 2, "c": 3})), 250);
    }

    #[test]
    fn test_optimal_capacity_picks_category() {
        let categories = SizeCategories::default();
        assert_eq!(optimal_capacity(&json!([]), &categories), 1024);
        assert_eq!(optimal_capacity(&vec![1; 5], &categories), 1024);
        assert_eq!(optimal_capacity(&vec![1; 50], &categories), 4096);
        assert_eq!(optimal_capacity(&vec![1; 500], &categories), 16384);
        assert_eq!(optimal_capacity(&vec![1; 5000], &categories), 65536);
        assert_eq!(optimal_capacity(&"x".repeat(1004), &categories), 1024);
        assert_eq!(optimal_capacity(&"x".repeat(1005), &categories), 4096);
    }

    #[test]
    fn test_optimal_capacity_beyond_largest() {
        let categories = SizeCategories::default();
        assert_eq!(optimal_capacity(&"x".repeat(70_000), &categories), 131072);
        assert_eq!(Shape::Record(2000).optimal_capacity(&categories), 131072);

        let tiny = SizeCategories::from_pairs([("only", 256)]);
        assert_eq!(Shape::Record(10).optimal_capacity(&tiny), 1024);
        assert_eq!(optimal_capacity(&7u8, &tiny), 256);
    }

    #[test]
    fn test_capacity_for_estimate_without_categories() {
        assert_eq!(capacity_for_estimate(300, &SizeCategories::empty()), 512);
    }
}
