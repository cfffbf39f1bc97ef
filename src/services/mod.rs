pub mod providers;
pub mod workflow;

pub use providers::RecommendationProvider;
pub use workflow::{WorkflowController, WorkflowSnapshot};
