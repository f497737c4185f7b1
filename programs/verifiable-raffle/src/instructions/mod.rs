pub use enter_raffle::*;
pub use fulfill_randomness::*;
pub use init_raffle::*;
pub use start_raffle::*;

pub mod enter_raffle;
pub mod fulfill_randomness;
pub mod init_raffle;
pub mod start_raffle;
