pub mod firmware;
pub mod stats;
pub mod system;
