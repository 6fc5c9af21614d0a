//! Tool execution seam, schema registry, and the HR tools backed by an employee directory.

pub mod directory;
pub mod executor;
pub mod hr;
pub mod registry;

pub use directory::{DirectoryError, HrDirectory, MockHrDirectory};
pub use executor::{ToolCall, ToolError, ToolExecutor, ToolOutput};
pub use hr::HrToolExecutor;
pub use registry::{ToolDef, ToolRegistry};
