//! Interval overlap index for teenrich.
//!
//! Overlap lookups between repeats and reference features, and between candidate
//! placements and exclusion/inclusion regions, all go through this crate.
//!
//! ```rust
//! use teenrich_overlaprs::{Bits, Overlapper, Interval};
//!
//! let peaks = vec![
//!     Interval { start: 100u32, end: 200, val: "peak1" },
//!     Interval { start: 150, end: 300, val: "peak2" },
//!     Interval { start: 400, end: 500, val: "peak3" },
//! ];
//!
//! let index = Bits::build(peaks);
//! assert_eq!(index.find_iter(180, 250).count(), 2);
//! ```

/// Binary Interval Search implementation.
///
/// See [`Bits`] for details.
pub mod bits;

/// Per-chromosome indexing.
pub mod chrom_index;

/// Core traits for overlap operations.
///
/// See [`Overlapper`] for the main trait.
pub mod traits;

// re-exports
pub use self::bits::Bits;
pub use self::chrom_index::ChromIndex;
pub use self::traits::{Interval, Overlapper};
