// equation/mod.rs
// Re-exports and module declarations for the equation system

mod types;
mod series;

pub use types::*;
pub use series::*;

#[cfg(test)]
mod tests;
