use std::sync::Arc;

use crate::llm_client::CompletionProvider;
use crate::recommender::controller::SharedController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single mounted form. Reset replaces its contents, never the Arc.
    pub controller: SharedController,
    /// Completion backend. Default: CompletionClient against the configured endpoint.
    pub completion: Arc<dyn CompletionProvider>,
}
