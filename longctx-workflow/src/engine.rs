pub mod process;
pub mod answering;
pub mod chunker;
pub mod launcher;

pub use answering::*;
pub use chunker::*;
pub use launcher::*;
