use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::error::ApiAuthError;
use crate::models::{CurrentUser, VerifySetupRequest, VerifySetupResponse};
use crate::router::AuthState;

/// Complete 2FA enrollment by confirming a code from the authenticator app.
///
/// On success 2FA becomes enabled and the backup codes are returned, once.
#[utoipa::path(
    post,
    path = "/2fa/verify-setup",
    tag = "2fa",
    request_body = VerifySetupRequest,
    responses(
        (status = 200, description = "2FA enabled", body = VerifySetupResponse),
        (status = 400, description = "Invalid token"),
        (status = 409, description = "No setup in progress"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn verify_two_factor_setup(
    State(state): State<AuthState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<VerifySetupRequest>,
) -> Result<Json<VerifySetupResponse>, ApiAuthError> {
    payload
        .validate()
        .map_err(|e| ApiAuthError::Validation(e.to_string()))?;

    let backup_codes = state.two_factor.verify_setup(user.0, &payload.token).await?;

    Ok(Json(VerifySetupResponse {
        enabled: true,
        backup_codes,
    }))
}
