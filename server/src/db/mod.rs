//! Storage for the mirrored tree.

mod file;
mod store;

pub use file::*;
pub use store::*;
