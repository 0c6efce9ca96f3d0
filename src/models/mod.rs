pub mod block;
pub mod chain;
pub mod congestion;
pub mod forecast;
pub mod freshness;
pub mod gas;
pub mod response;
pub mod wei;

pub use block::*;
pub use chain::*;
pub use congestion::*;
pub use forecast::*;
pub use freshness::*;
pub use gas::*;
pub use response::*;
