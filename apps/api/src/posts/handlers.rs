//! Axum route handlers for post choices and client management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::client::Client;
use crate::posts::store::{create_client, find_post, get_clients, get_user, mark_post_chosen};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostChoiceRequest {
    pub user_id: String,
    pub post_id: String,
    pub chosen_index: i32,
    pub client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub user_id: String,
    pub name: String,
    pub industry: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClientListResponse {
    pub clients: Vec<Client>,
}

/// POST /save_choice
pub async fn handle_save_choice(
    State(state): State<AppState>,
    Json(request): Json<PostChoiceRequest>,
) -> Result<Json<bool>, AppError> {
    let post = find_post(&state.db, &request.post_id)
        .await?
        .filter(|p| p.user_id == request.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", request.post_id)))?;

    if !mark_post_chosen(&state.db, &post.post_id).await? {
        return Err(AppError::NotFound(format!("Post {} not found", post.post_id)));
    }

    info!(
        "User {} chose post {} (index {}, client {:?})",
        request.user_id,
        post.post_id,
        request.chosen_index,
        request.client_id.as_deref().or(post.client_id.as_deref())
    );
    Ok(Json(true))
}

/// GET /clients/:user_id
///
/// Unknown users simply have no clients.
pub async fn handle_get_clients(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ClientListResponse>, AppError> {
    let clients = match get_user(&state.db, &user_id).await? {
        Some(_) => get_clients(&state.db, &user_id).await?,
        None => Vec::new(),
    };
    Ok(Json(ClientListResponse { clients }))
}

/// POST /clients
pub async fn handle_create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".to_string()));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let client = create_client(
        &state.db,
        &request.user_id,
        request.name.trim(),
        request.industry.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(client)))
}
