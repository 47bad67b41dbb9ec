//! Language-model assisted operations.
//!
//! Each operation reads what it needs from the store, renders a prompt,
//! calls the selected generator, and validates the reply before anything
//! is written or returned.

pub mod describe;
pub mod plan;
pub mod propose;
pub mod reply;

pub use describe::DescribeRequest;
pub use plan::{PlanCandidate, PlanReply};

use crate::db::Database;
use crate::generation::GeneratorRegistry;
use crate::prompts::PromptLibrary;
use std::sync::Arc;

/// Store, generators, and prompt templates used by the assisted endpoints.
#[derive(Clone)]
pub struct Assistant {
    db: Arc<Database>,
    generators: Arc<GeneratorRegistry>,
    prompts: Arc<PromptLibrary>,
}

impl Assistant {
    pub fn new(
        db: Arc<Database>,
        generators: Arc<GeneratorRegistry>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self {
            db,
            generators,
            prompts,
        }
    }
}
