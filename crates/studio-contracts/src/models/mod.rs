mod registry;
mod selectors;

pub use registry::{ModelSpec, Tier, TierRegistry};
pub use selectors::{fallback_chain, select, OperationKind, Selection, Task, UpscaleResolution};
