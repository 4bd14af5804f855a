pub mod pattern_library;
pub mod predictor;
pub mod session;

pub use pattern_library::*;
pub use predictor::*;
pub use session::*;
