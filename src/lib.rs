pub mod backtest;
pub mod data;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod evaluation;
