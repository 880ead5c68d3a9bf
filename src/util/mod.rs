//! Small shared utilities: the concurrent bitset and the lazy
//! uninitialised buffer backing CSR edge storage.

pub mod bitset;
pub mod lazy;

pub use bitset::DynamicBitset;
pub use lazy::LazyBuffer;
