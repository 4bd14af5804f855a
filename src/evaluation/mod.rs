pub mod metrics;
pub mod ranges;
pub mod scorer;

pub use metrics::*;
pub use ranges::*;
pub use scorer::*;
