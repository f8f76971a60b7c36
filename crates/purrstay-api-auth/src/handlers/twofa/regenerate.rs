use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::error::ApiAuthError;
use crate::models::{BackupCodesResponse, CurrentUser, RegenerateBackupCodesRequest};
use crate::router::AuthState;

/// Replace the backup-code batch. Requires a current TOTP code; the old
/// batch is invalidated whether used or not.
pub async fn regenerate_backup_codes(
    State(state): State<AuthState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<RegenerateBackupCodesRequest>,
) -> Result<Json<BackupCodesResponse>, ApiAuthError> {
    payload
        .validate()
        .map_err(|e| ApiAuthError::Validation(e.to_string()))?;

    let backup_codes = state
        .two_factor
        .regenerate_backup_codes(user.0, &payload.token)
        .await?;

    Ok(Json(BackupCodesResponse { backup_codes }))
}
