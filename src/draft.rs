//! Retrieval-augmented task-description drafting.
//!
//! One stateless pass per request:
//!
//! ```text
//! retrieve (if n_similar > 0) ──▶ build prompt ──▶ generate ──▶ done
//! ```
//!
//! Retrieval pulls the `n_similar` nearest issue exhibits from the
//! project's vector index; the prompt interpolates each exhibit wrapped in
//! `"""` fences together with the new task summary; generation runs at the
//! caller-supplied temperature. With `n_similar = 0` the retrieval stage
//! is skipped entirely — empty exhibit list, zero extra token cost.
//!
//! There is no fallback answer: a failing generation call propagates.

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::generation::GenerationBackend;
use crate::models::TokenUsage;
use crate::search::VectorSearch;

/// Role instruction for the generation backend: a structured-ticket author
/// producing the four-section format.
pub const SYSTEM_PROMPT: &str = "You are a detail oriented Software Product Owner responsible for defining tasks in a software development team. \
When you do your job, you always try to be as clear and detailed as possible, you provide diagrams, code snippets, pseudocodes, etc. \
Your aim is to make sure that developers understand the requirements. \
You have been tasked with creating JIRA tickets for defining development requirements in the following format:\n\
I want you create JIRA task descriptions in the following format:\n\
1. Description: Intoduction to the task. You should come up with a story here and detail \
why we are implementing this task, what is the purpose.\n\
2. How: Detailed clarification of how the task should implemented. This would require \
details about the implementation and tooling, libraries to be used etc. \
You can be creative and include diagrams, code snippets, and suggest your own ideas from your knowledge base. \
Come up with clear directives, so that the development team can understand it better.\n\
3. Key Contacts: Name of stakeholders\n\
4. Definition of Done:steps that should be completed before transition of task into DONE status. \
You can keep it simple and dont repeat everything you have mentioned in 'How' section. \
You can also include the acceptance criteria here.\n";

/// A drafted description plus the exhibits and token accounting behind it.
#[derive(Debug, Clone)]
pub struct DraftedTask {
    /// The generated task description.
    pub answer: String,
    /// Retrieved exhibit texts, in similarity order.
    pub similar_tasks: Vec<String>,
    /// Tokens spent embedding the retrieval query.
    pub query_tokens: u64,
    /// Usage reported by the generation backend.
    pub usage: TokenUsage,
}

/// Render the user prompt: each exhibit fenced in `"""`, then the ask.
pub fn build_prompt(task_summary: &str, similar_tasks: &[String]) -> String {
    let exhibits = similar_tasks
        .iter()
        .map(|task| format!("\"\"\"\n{task}\n\"\"\""))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the task summary and description pairs below to create a JIRA task description \
         for the subsequent question:\n\n{exhibits}\n\
         Please create a new JIRA task description from the Summary: {task_summary}"
    )
}

/// Drafts new task descriptions grounded in a project's indexed issues.
pub struct TaskDrafter {
    store: Arc<dyn VectorSearch>,
    backend: Arc<dyn GenerationBackend>,
}

impl TaskDrafter {
    pub fn new(store: Arc<dyn VectorSearch>, backend: Arc<dyn GenerationBackend>) -> Self {
        Self { store, backend }
    }

    /// Draft a description for a new task.
    ///
    /// # Errors
    ///
    /// Retrieval errors (missing index, model mismatch) and generation
    /// backend failures propagate uncaught.
    pub fn create_task_description(
        &self,
        project: &str,
        task_summary: &str,
        task_desc: &str,
        n_similar: usize,
        temperature: f32,
    ) -> Result<DraftedTask> {
        let retrieval = self
            .store
            .similarity_search(project, task_summary, task_desc, n_similar)?;

        let prompt = build_prompt(task_summary, &retrieval.matches);
        let completion = self.backend.generate(SYSTEM_PROMPT, &prompt, temperature)?;

        info!(
            project,
            exhibits = retrieval.matches.len(),
            completion_tokens = completion.usage.completion_tokens,
            "drafted task description"
        );

        Ok(DraftedTask {
            answer: completion.text,
            similar_tasks: retrieval.matches,
            query_tokens: retrieval.query_tokens,
            usage: completion.usage,
        })
    }
}
