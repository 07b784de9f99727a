use std::sync::Arc;

use jobbot_core::PostingExtractor;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    /// Extraction pipeline; shares one host throttle across all requests.
    pub extractor: Arc<dyn PostingExtractor>,
}
