use std::sync::Arc;

use sqlx::PgPool;

use crate::generation::generator::PostGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Owns the phrase banks and the per-client memory for the process lifetime.
    pub generator: Arc<PostGenerator>,
}
