pub mod cache;
pub mod feed;

pub use cache::*;
pub use feed::*;
