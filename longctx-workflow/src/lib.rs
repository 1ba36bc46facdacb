pub mod agent;
pub mod data_loading;
pub mod engine;
pub mod extract;
pub mod lifecycle;
pub mod runner;
pub mod strategy;

pub use agent::*;
pub use data_loading::*;
pub use engine::*;
pub use extract::*;
pub use lifecycle::*;
pub use runner::*;
pub use strategy::*;
