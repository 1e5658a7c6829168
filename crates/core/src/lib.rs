pub mod config;
pub mod model;
pub mod names;

pub use config::Config;
pub use model::*;
pub use names::*;
