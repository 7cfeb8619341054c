pub mod artifacts;
pub mod audit;
pub mod errors;

pub use artifacts::*;
pub use audit::*;
pub use errors::*;
