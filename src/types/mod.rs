//! Shared data types.

pub mod tool;

pub use tool::{FunctionDefinition, ToolDefinition};
