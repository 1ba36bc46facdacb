pub mod export;
pub mod hook;
pub mod run;
pub mod runs;
pub mod stats;
