pub mod events;
pub mod macros;
pub mod registry;
pub mod schemas;
pub mod toolbelts;

pub use events::LoopEvent;
pub use registry::{RegistryError, ToolHandler, ToolOutcome, ToolRegistry, Toolbelt};
pub use schemas::{FunctionDefinition, ParameterSpec, Tool, ToolSpec};
