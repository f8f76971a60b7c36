//! 2FA lifecycle endpoints.
//!
//! All routes here require an authenticated session; `CurrentUser` is
//! injected by the surrounding application's auth middleware.

mod disable;
mod regenerate;
mod setup;
mod status;
mod verify_setup;

pub use disable::disable_two_factor;
pub use regenerate::regenerate_backup_codes;
pub use setup::setup_two_factor;
pub use status::two_factor_status;
pub use verify_setup::verify_two_factor_setup;
