pub mod cost;
pub mod evaluated_solution;
