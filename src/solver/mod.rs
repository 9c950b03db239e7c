pub mod callback;
pub mod pmedian;
