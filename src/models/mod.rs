// Models module for data structures
pub mod invocation;
pub mod package;
