//! Drawing surfaces and the vector-field renderer.
//!
//! The renderer only talks to [`surface::DrawingSurface`]; [`cpu::CpuSurface`] is the bundled
//! backend.

pub(crate) mod composite;
/// `vello_cpu` surface.
pub mod cpu;
/// Per-frame vector drawing.
pub mod field;
/// Backend-neutral drawing operations.
pub mod surface;
