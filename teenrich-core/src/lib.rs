//! Core models for transposable element overlap enrichment testing.
//!
//! This crate holds the shared data model used by the rest of the workspace:
//!
//! - [`models::Region`] and the non-overlapping reference [`models::FeatureSet`]
//! - [`models::RepeatElement`] with its [`models::TaxonomyPath`] classification
//! - [`models::TssIndex`] for distance-to-TSS computations
//!
//! and the [`readers`] for BED, RepeatMasker `.out`, GTF and age tables.
//!
//! # Example
//!
//! ```no_run
//! use teenrich_core::models::FeatureSet;
//! use teenrich_core::readers::read_repeatmasker;
//!
//! let peaks = FeatureSet::try_from("peaks.bed").unwrap();
//! let repeats = read_repeatmasker("hg38.fa.out.gz").unwrap();
//! ```

pub mod errors;
pub mod models;
pub mod readers;
pub mod utils;
