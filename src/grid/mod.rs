// grid/mod.rs
// Re-exports for the beaker grid: coordinates, allocation and fractioned drawing

mod coordinate;
mod fractioned;
mod limited;

pub use coordinate::*;
pub use fractioned::*;
pub use limited::*;
