//! Service layer for authentication and the 2FA lifecycle.

pub mod login_challenge;
pub mod password;
pub mod session;
pub mod two_factor;

pub use login_challenge::{LoginChallengeService, LoginOutcome};
pub use session::{IssuedSession, JwtSessionIssuer, SessionIssuer};
pub use two_factor::{SecondFactor, TwoFactorService, TwoFactorSetup, TwoFactorStatus};
