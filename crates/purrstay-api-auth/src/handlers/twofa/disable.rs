use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::error::ApiAuthError;
use crate::models::{CurrentUser, DisableRequest, DisableResponse};
use crate::router::AuthState;

/// Disable 2FA. Requires the account password and a current second factor.
#[utoipa::path(
    post,
    path = "/2fa/disable",
    tag = "2fa",
    request_body = DisableRequest,
    responses(
        (status = 200, description = "2FA disabled", body = DisableResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 409, description = "2FA is not enabled"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn disable_two_factor(
    State(state): State<AuthState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DisableRequest>,
) -> Result<Json<DisableResponse>, ApiAuthError> {
    payload
        .validate()
        .map_err(|e| ApiAuthError::Validation(e.to_string()))?;

    state
        .two_factor
        .disable(user.0, &payload.password, &payload.code)
        .await?;

    Ok(Json(DisableResponse {}))
}
