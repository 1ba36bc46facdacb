pub mod ids;
pub mod config;
pub mod run;
pub mod evaluation;
pub mod dataset;
pub mod state;

pub use ids::*;
pub use config::*;
pub use run::*;
pub use evaluation::*;
pub use dataset::*;
pub use state::*;
