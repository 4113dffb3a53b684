pub mod config;
pub mod routine;
pub mod stats;
pub mod timer;
