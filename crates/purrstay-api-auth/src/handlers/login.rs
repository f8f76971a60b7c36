//! Login endpoints: password step and second-factor step.

use axum::{extract::State, Json};
use validator::Validate;

use crate::error::ApiAuthError;
use crate::models::{LoginRequest, LoginResponse, VerifyLoginRequest};
use crate::router::AuthState;
use crate::services::LoginOutcome;

/// Password step of login.
///
/// Accounts without 2FA get a session directly; 2FA-enabled accounts get a
/// challenge handle to answer with a second factor.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued or challenge required", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiAuthError> {
    payload
        .validate()
        .map_err(|e| ApiAuthError::Validation(e.to_string()))?;

    let outcome = state
        .challenges
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(match outcome {
        LoginOutcome::Session(session) => LoginResponse::Session {
            token: session.token,
            expires_in: session.expires_in,
        },
        LoginOutcome::ChallengeRequired {
            challenge_id,
            expires_in,
        } => LoginResponse::MfaRequired {
            mfa_required: true,
            challenge_id,
            expires_in,
        },
    }))
}

/// Second-factor step of login. Answers an open challenge with a TOTP code
/// or a backup code.
#[utoipa::path(
    post,
    path = "/login/verify",
    tag = "auth",
    request_body = VerifyLoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Invalid code"),
        (status = 401, description = "Challenge expired or exhausted"),
    )
)]
pub async fn verify_login(
    State(state): State<AuthState>,
    Json(payload): Json<VerifyLoginRequest>,
) -> Result<Json<LoginResponse>, ApiAuthError> {
    payload
        .validate()
        .map_err(|e| ApiAuthError::Validation(e.to_string()))?;

    let session = state
        .challenges
        .verify(payload.challenge_id, &payload.code)
        .await?;

    Ok(Json(LoginResponse::Session {
        token: session.token,
        expires_in: session.expires_in,
    }))
}
