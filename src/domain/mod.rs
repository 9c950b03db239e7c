pub mod problem;
pub mod solution;
pub mod types;
