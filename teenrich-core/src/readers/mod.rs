//! Readers turning annotation files into in-memory models.

pub mod age;
pub mod repeatmasker;
pub mod tss;

pub use self::age::AgeTable;
pub use self::repeatmasker::read_repeatmasker;
pub use self::tss::read_tss;
