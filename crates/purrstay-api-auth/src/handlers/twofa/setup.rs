use axum::{extract::State, Extension, Json};

use crate::error::ApiAuthError;
use crate::models::{CurrentUser, SetupResponse};
use crate::router::AuthState;

/// Begin 2FA enrollment for the authenticated account.
///
/// Returns the secret and provisioning URI. Repeat calls while setup is
/// pending replace the previous secret.
#[utoipa::path(
    post,
    path = "/2fa/setup",
    tag = "2fa",
    responses(
        (status = 200, description = "Setup initiated", body = SetupResponse),
        (status = 409, description = "2FA is already enabled"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn setup_two_factor(
    State(state): State<AuthState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<SetupResponse>, ApiAuthError> {
    let setup = state.two_factor.setup(user.0).await?;

    Ok(Json(SetupResponse {
        secret: setup.secret,
        provisioning_uri: setup.provisioning_uri,
    }))
}
