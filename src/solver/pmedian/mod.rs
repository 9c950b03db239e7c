pub mod construction;
pub mod diversification;
pub mod neighbourhood;
pub mod regret;
pub mod run;
pub mod search;

pub use construction::regret_assign;
pub use diversification::{mutate_centres, random_centres};
pub use neighbourhood::{intercluster_moves, intercluster_swaps, nearest_clusters};
pub use search::{solve, Solver};
