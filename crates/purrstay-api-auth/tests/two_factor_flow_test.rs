//! Lifecycle scenarios: enrollment, status, disable, backup codes.

mod common;

use common::{current_code, wrong_code, TestEnv, PASSWORD};
use purrstay_api_auth::backup_codes::hash_code;
use purrstay_api_auth::error::ApiAuthError;

#[tokio::test]
async fn enrollment_enables_and_issues_ten_backup_codes() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");

    let (_, codes) = env.enroll(user_id).await;
    assert_eq!(codes.len(), 10);

    let status = env.two_factor.status(user_id).await.unwrap();
    assert!(status.enabled);
    assert!(!status.has_pending_setup);
    assert_eq!(status.backup_codes_remaining, 10);
}

#[tokio::test]
async fn status_before_any_setup_is_all_off() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");

    let status = env.two_factor.status(user_id).await.unwrap();
    assert!(!status.enabled);
    assert!(!status.has_pending_setup);
    assert_eq!(status.backup_codes_remaining, 0);
}

#[tokio::test]
async fn verify_setup_without_setup_reports_no_pending() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");

    let err = env
        .two_factor
        .verify_setup(user_id, "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::NoPendingSetup));
}

#[tokio::test]
async fn wrong_token_leaves_pending_setup_retryable() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");

    let setup = env.two_factor.setup(user_id).await.unwrap();
    let secret = data_encoding::BASE32_NOPAD
        .decode(setup.secret.as_bytes())
        .unwrap();

    let err = env
        .two_factor
        .verify_setup(user_id, &wrong_code(&secret))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::InvalidToken));

    let status = env.two_factor.status(user_id).await.unwrap();
    assert!(!status.enabled);
    assert!(status.has_pending_setup);

    // The same pending secret still verifies.
    env.two_factor
        .verify_setup(user_id, &current_code(&secret))
        .await
        .unwrap();
    assert!(env.two_factor.status(user_id).await.unwrap().enabled);
}

#[tokio::test]
async fn repeated_setup_replaces_the_pending_secret() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");

    let first = env.two_factor.setup(user_id).await.unwrap();
    let second = env.two_factor.setup(user_id).await.unwrap();
    assert_ne!(first.secret, second.secret);

    let old_secret = data_encoding::BASE32_NOPAD
        .decode(first.secret.as_bytes())
        .unwrap();
    let new_secret = data_encoding::BASE32_NOPAD
        .decode(second.secret.as_bytes())
        .unwrap();

    // Codes from the discarded secret no longer verify.
    let err = env
        .two_factor
        .verify_setup(user_id, &current_code(&old_secret))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::InvalidToken));

    env.two_factor
        .verify_setup(user_id, &current_code(&new_secret))
        .await
        .unwrap();
}

#[tokio::test]
async fn setup_is_rejected_once_enabled() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    env.enroll(user_id).await;

    let err = env.two_factor.setup(user_id).await.unwrap_err();
    assert!(matches!(err, ApiAuthError::AlreadyEnabled));
}

#[tokio::test]
async fn repeated_verify_setup_reports_no_pending() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (secret, _) = env.enroll(user_id).await;

    // The pending slot was consumed by the first verification; replaying the
    // same (still-valid) code is a stale retry, not a conflict.
    let err = env
        .two_factor
        .verify_setup(user_id, &current_code(&secret))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::NoPendingSetup));

    assert!(env.two_factor.status(user_id).await.unwrap().enabled);
}

#[tokio::test]
async fn backup_code_is_single_use() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (_, codes) = env.enroll(user_id).await;

    env.two_factor
        .verify_second_factor(user_id, &codes[0])
        .await
        .unwrap();

    let status = env.two_factor.status(user_id).await.unwrap();
    assert_eq!(status.backup_codes_remaining, 9);

    let err = env
        .two_factor
        .verify_second_factor(user_id, &codes[0])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::InvalidToken));
}

#[tokio::test]
async fn concurrent_consume_of_one_code_succeeds_exactly_once() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (_, codes) = env.enroll(user_id).await;
    let code = codes[0].clone();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let tf = env.two_factor.clone();
            let code = code.clone();
            tokio::spawn(async move { tf.verify_second_factor(user_id, &code).await })
        })
        .collect();

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(
        env.two_factor
            .status(user_id)
            .await
            .unwrap()
            .backup_codes_remaining,
        9
    );
}

#[tokio::test]
async fn regeneration_invalidates_the_old_batch() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (secret, old_codes) = env.enroll(user_id).await;

    let new_codes = env
        .two_factor
        .regenerate_backup_codes(user_id, &current_code(&secret))
        .await
        .unwrap();
    assert_eq!(new_codes.len(), 10);

    let err = env
        .two_factor
        .verify_second_factor(user_id, &old_codes[0])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::InvalidToken));

    env.two_factor
        .verify_second_factor(user_id, &new_codes[0])
        .await
        .unwrap();
}

#[tokio::test]
async fn regeneration_rejects_a_backup_code_as_proof() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (_, codes) = env.enroll(user_id).await;

    let err = env
        .two_factor
        .regenerate_backup_codes(user_id, &codes[0])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::InvalidToken));

    // The submitted code was not burned.
    assert_eq!(
        env.two_factor
            .status(user_id)
            .await
            .unwrap()
            .backup_codes_remaining,
        10
    );
}

#[tokio::test]
async fn regeneration_requires_enabled_two_factor() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");

    let err = env
        .two_factor
        .regenerate_backup_codes(user_id, "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::NotEnabled));
}

#[tokio::test]
async fn disable_requires_both_proofs() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (secret, _) = env.enroll(user_id).await;

    let err = env
        .two_factor
        .disable(user_id, "wrong password", &current_code(&secret))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::InvalidCredentials));

    let err = env
        .two_factor
        .disable(user_id, PASSWORD, &wrong_code(&secret))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::InvalidCredentials));

    // Still enabled after both failures.
    assert!(env.two_factor.status(user_id).await.unwrap().enabled);

    env.two_factor
        .disable(user_id, PASSWORD, &current_code(&secret))
        .await
        .unwrap();

    let status = env.two_factor.status(user_id).await.unwrap();
    assert!(!status.enabled);
    assert!(!status.has_pending_setup);
    assert_eq!(status.backup_codes_remaining, 0);
}

#[tokio::test]
async fn disable_accepts_a_backup_code_as_second_factor() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (_, codes) = env.enroll(user_id).await;

    env.two_factor
        .disable(user_id, PASSWORD, &codes[0])
        .await
        .unwrap();
    assert!(!env.two_factor.status(user_id).await.unwrap().enabled);
}

#[tokio::test]
async fn disable_when_not_enabled_is_a_conflict() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");

    let err = env
        .two_factor
        .disable(user_id, PASSWORD, "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::NotEnabled));
}

#[tokio::test]
async fn re_enrollment_after_disable_issues_fresh_material() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (secret, codes) = env.enroll(user_id).await;

    env.two_factor
        .disable(user_id, PASSWORD, &current_code(&secret))
        .await
        .unwrap();

    let (new_secret, new_codes) = env.enroll(user_id).await;
    assert_ne!(secret, new_secret);
    assert_ne!(codes, new_codes);

    // Old backup codes are gone for good.
    let err = env
        .two_factor
        .verify_second_factor(user_id, &codes[0])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::InvalidToken));
}

#[tokio::test]
async fn only_hashes_are_stored_for_backup_codes() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (_, codes) = env.enroll(user_id).await;

    let stored = env.store.unused_code_hashes(user_id);
    for code in &codes {
        assert!(!stored.contains(code));
        assert!(stored.contains(&hash_code(code)));
    }
}
