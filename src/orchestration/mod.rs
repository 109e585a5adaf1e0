// Orchestration - one storage event in, one published translation per target language out

pub mod orchestrator;
pub mod types;

pub use orchestrator::Orchestrator;
pub use types::*;
