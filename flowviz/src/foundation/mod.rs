/// Pixel and geometry primitives.
pub mod core;
/// Crate-wide error type.
pub mod error;
