//! API request and response models.

pub mod requests;
pub mod responses;

use uuid::Uuid;

/// Authenticated user identity, injected by the surrounding application's
/// auth middleware as a request extension.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

pub use requests::{
    DisableRequest, LoginRequest, RegenerateBackupCodesRequest, VerifyLoginRequest,
    VerifySetupRequest,
};
pub use responses::{
    BackupCodesResponse, DisableResponse, LoginResponse, SetupResponse, StatusResponse,
    VerifySetupResponse,
};
