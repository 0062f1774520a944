pub mod builtin;
pub mod guard;
pub mod handler;
pub mod pipeline;
pub mod registry;

pub use guard::OutputGuard;
pub use handler::{ActionDef, ActionHandler};
pub use pipeline::{ActionOutput, ActionPipeline};
pub use registry::ActionRegistry;
