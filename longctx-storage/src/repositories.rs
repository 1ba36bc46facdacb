pub mod run;
pub mod result;

pub use run::*;
pub use result::*;
