use std::sync::Arc;

use crate::config::Config;
use crate::interview::InterviewService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The interview core: lifecycle, grading, reports, export. Holds its
    /// own store/grader/renderer seams behind trait objects.
    pub interviews: Arc<InterviewService>,
    /// Service configuration, retained for handlers that need ambient settings.
    #[allow(dead_code)]
    pub config: Config,
}
