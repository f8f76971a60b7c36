//! Two-step login scenarios.

mod common;

use common::{current_code, wrong_code, TestEnv, PASSWORD};
use purrstay_api_auth::error::ApiAuthError;
use purrstay_api_auth::services::LoginOutcome;

#[tokio::test]
async fn login_without_two_factor_issues_a_session_directly() {
    let env = TestEnv::new();
    env.add_user("muffin@example.com");

    let outcome = env
        .challenges
        .login("muffin@example.com", PASSWORD)
        .await
        .unwrap();
    assert!(matches!(outcome, LoginOutcome::Session(_)));
}

#[tokio::test]
async fn login_with_two_factor_requires_a_challenge() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (secret, _) = env.enroll(user_id).await;

    let outcome = env
        .challenges
        .login("muffin@example.com", PASSWORD)
        .await
        .unwrap();
    let LoginOutcome::ChallengeRequired { challenge_id, .. } = outcome else {
        panic!("expected a challenge, got a session");
    };

    let session = env
        .challenges
        .verify(challenge_id, &current_code(&secret))
        .await
        .unwrap();
    assert!(!session.token.is_empty());
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let env = TestEnv::new();
    env.add_user("muffin@example.com");
    env.store.add_user(
        "dormant@example.com",
        &purrstay_api_auth::services::password::hash_password(PASSWORD).unwrap(),
        false,
    );

    for (email, password) in [
        ("muffin@example.com", "wrong password"),
        ("nobody@example.com", PASSWORD),
        ("dormant@example.com", PASSWORD),
    ] {
        let err = env.challenges.login(email, password).await.unwrap_err();
        assert!(matches!(err, ApiAuthError::InvalidCredentials));
    }
}

#[tokio::test]
async fn login_email_lookup_ignores_case() {
    let env = TestEnv::new();
    env.add_user("muffin@example.com");

    let outcome = env
        .challenges
        .login("Muffin@Example.com", PASSWORD)
        .await
        .unwrap();
    assert!(matches!(outcome, LoginOutcome::Session(_)));
}

#[tokio::test]
async fn challenge_accepts_a_backup_code() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (_, codes) = env.enroll(user_id).await;

    let LoginOutcome::ChallengeRequired { challenge_id, .. } = env
        .challenges
        .login("muffin@example.com", PASSWORD)
        .await
        .unwrap()
    else {
        panic!("expected a challenge");
    };

    env.challenges.verify(challenge_id, &codes[0]).await.unwrap();

    // The code was burned.
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
async fn challenge_is_single_use() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (secret, _) = env.enroll(user_id).await;

    let LoginOutcome::ChallengeRequired { challenge_id, .. } = env
        .challenges
        .login("muffin@example.com", PASSWORD)
        .await
        .unwrap()
    else {
        panic!("expected a challenge");
    };

    env.challenges
        .verify(challenge_id, &current_code(&secret))
        .await
        .unwrap();

    let err = env
        .challenges
        .verify(challenge_id, &current_code(&secret))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::ChallengeExpired));
}

#[tokio::test]
async fn expired_challenge_is_rejected_and_removed() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (secret, _) = env.enroll(user_id).await;

    let LoginOutcome::ChallengeRequired { challenge_id, .. } = env
        .challenges
        .login("muffin@example.com", PASSWORD)
        .await
        .unwrap()
    else {
        panic!("expected a challenge");
    };

    env.store.expire_challenge(challenge_id);

    let err = env
        .challenges
        .verify(challenge_id, &current_code(&secret))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::ChallengeExpired));

    // Gone entirely, not just marked.
    let err = env
        .challenges
        .verify(challenge_id, &current_code(&secret))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::ChallengeExpired));
}

#[tokio::test]
async fn challenge_is_destroyed_after_five_failures() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    let (secret, _) = env.enroll(user_id).await;

    let LoginOutcome::ChallengeRequired { challenge_id, .. } = env
        .challenges
        .login("muffin@example.com", PASSWORD)
        .await
        .unwrap()
    else {
        panic!("expected a challenge");
    };

    let bad = wrong_code(&secret);
    for _ in 0..4 {
        let err = env.challenges.verify(challenge_id, &bad).await.unwrap_err();
        assert!(matches!(err, ApiAuthError::InvalidToken));
    }

    let err = env.challenges.verify(challenge_id, &bad).await.unwrap_err();
    assert!(matches!(err, ApiAuthError::ChallengeExhausted));

    // Even a correct code cannot revive it.
    let err = env
        .challenges
        .verify(challenge_id, &current_code(&secret))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::ChallengeExpired));
}

#[tokio::test]
async fn malformed_submission_counts_as_a_failed_attempt() {
    let env = TestEnv::new();
    let user_id = env.add_user("muffin@example.com");
    env.enroll(user_id).await;

    let LoginOutcome::ChallengeRequired { challenge_id, .. } = env
        .challenges
        .login("muffin@example.com", PASSWORD)
        .await
        .unwrap()
    else {
        panic!("expected a challenge");
    };

    let err = env
        .challenges
        .verify(challenge_id, "not-a-code")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::InvalidToken));
}

#[tokio::test]
async fn recording_a_failure_on_a_vanished_challenge_reads_as_expired() {
    use purrstay_api_auth::store::ChallengeStore;

    let env = TestEnv::new();
    let err = env
        .store
        .record_challenge_failure(uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiAuthError::ChallengeExpired));
}

#[tokio::test]
async fn sweep_removes_only_expired_challenges() {
    let env = TestEnv::new();
    let user_a = env.add_user("muffin@example.com");
    let user_b = env.add_user("biscuit@example.com");
    env.enroll(user_a).await;
    env.enroll(user_b).await;

    let LoginOutcome::ChallengeRequired { challenge_id: stale, .. } = env
        .challenges
        .login("muffin@example.com", PASSWORD)
        .await
        .unwrap()
    else {
        panic!("expected a challenge");
    };
    let LoginOutcome::ChallengeRequired { .. } = env
        .challenges
        .login("biscuit@example.com", PASSWORD)
        .await
        .unwrap()
    else {
        panic!("expected a challenge");
    };

    env.store.expire_challenge(stale);

    assert_eq!(env.challenges.sweep_expired().await.unwrap(), 1);
    assert_eq!(env.challenges.sweep_expired().await.unwrap(), 0);
}
