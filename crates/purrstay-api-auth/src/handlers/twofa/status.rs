use axum::{extract::State, Extension, Json};

use crate::error::ApiAuthError;
use crate::models::{CurrentUser, StatusResponse};
use crate::router::AuthState;

/// Report 2FA status for the authenticated account.
pub async fn two_factor_status(
    State(state): State<AuthState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<StatusResponse>, ApiAuthError> {
    let status = state.two_factor.status(user.0).await?;

    Ok(Json(StatusResponse {
        enabled: status.enabled,
        has_pending_setup: status.has_pending_setup,
        backup_codes_remaining: status.backup_codes_remaining,
    }))
}
