pub use raffle::*;

pub mod raffle;
