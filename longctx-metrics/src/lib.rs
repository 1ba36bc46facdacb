pub mod calculators;
pub mod aggregators;
pub mod summary;

pub use calculators::*;
pub use aggregators::*;
pub use summary::*;
