pub mod sqlite;
pub mod repositories;
pub mod store;
pub mod export;

pub use repositories::*;
pub use store::*;
pub use export::*;
