//! Concurrent, cancellable, all-or-nothing resource loading.

/// Batch state machine over a [`source::ResourceSource`].
pub mod batch;
/// Byte transports.
pub mod source;
