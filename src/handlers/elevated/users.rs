// handlers/elevated/users.rs - GET /api/v1/users
use axum::extract::State;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Every account, oldest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.store.list_users().await?;
    Ok(ApiResponse::success(users, "Users fetched"))
}
