// reaction/mod.rs
// Re-exports and module declarations for the reaction progress coordinator

mod progress;
mod reconcile;
pub mod observer;

pub use progress::*;
pub use reconcile::*;

#[cfg(test)]
mod tests;
