pub mod chemistry;
pub mod config;
pub mod equation;
pub mod experiment;
pub mod grid;
pub mod molecule;
pub mod phase;
pub mod reaction;
pub mod scenario;
