pub mod constants;
pub mod dots;
pub mod engine;
pub mod error;
pub mod grid;
pub mod maze;
pub mod rng;
pub mod types;
