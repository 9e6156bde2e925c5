//! Scenario tests for the credential & MFA state machine
//!
//! Drives the use cases end to end against in-memory repository fakes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::outcome::{ConfirmOutcome, EnrollView, LoginOutcome, MfaOutcome};
use crate::application::{
    CheckSessionUseCase, EnrollMfaUseCase, LoginInput, LoginUseCase, SignOutUseCase,
    VerifyMfaUseCase,
};
use crate::domain::entity::login_event::{LoginEvent, LoginReason};
use crate::domain::entity::session::Session;
use crate::domain::entity::user::User;
use crate::domain::repository::{
    FailedAttempts, LoginEventRepository, SessionRepository, SettingsRepository, UserRepository,
};
use crate::domain::value_object::lockout::LOCKOUT_POLICY_KEY;
use crate::domain::value_object::pending_ticket::PendingMfaTicket;
use crate::domain::value_object::totp_secret::TotpSecret;
use crate::domain::value_object::user_password::hash_password;
use crate::error::{AuthError, AuthResult};

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Clone, Default)]
struct MemStore {
    users: Arc<Mutex<HashMap<uuid::Uuid, User>>>,
    events: Arc<Mutex<Vec<LoginEvent>>>,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    settings: Arc<Mutex<HashMap<String, String>>>,
}

impl MemStore {
    fn insert_user(&self, user: User) {
        self.users
            .lock()
            .unwrap()
            .insert(*user.user_id.as_uuid(), user);
    }

    fn user(&self, user_id: &UserId) -> User {
        self.users
            .lock()
            .unwrap()
            .get(user_id.as_uuid())
            .cloned()
            .expect("user exists")
    }

    fn reasons_for(&self, username: &str) -> Vec<LoginReason> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.username_attempted == username)
            .map(|e| e.reason)
            .collect()
    }

    fn set_setting(&self, key: &str, value: &str) {
        self.settings
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

impl UserRepository for MemStore {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(user_id.as_uuid()).cloned())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        self.users
            .lock()
            .unwrap()
            .insert(*user.user_id.as_uuid(), user.clone());
        Ok(())
    }
}

impl LoginEventRepository for MemStore {
    async fn record(&self, event: &LoginEvent) -> AuthResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn failed_attempts_since(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> AuthResult<FailedAttempts> {
        let events = self.events.lock().unwrap();
        let failures: Vec<_> = events
            .iter()
            .filter(|e| e.username_attempted == username && !e.success && e.created_at >= since)
            .collect();

        Ok(FailedAttempts {
            count: failures.len() as i64,
            last_failure_at: failures.iter().map(|e| e.created_at).max(),
        })
    }
}

impl SessionRepository for MemStore {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<Session>> {
        Ok(self.sessions.lock().unwrap().get(token).cloned())
    }

    async fn touch(&self, token: &str, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(s) = self.sessions.lock().unwrap().get_mut(token) {
            s.last_active_at = at;
        }
        Ok(())
    }

    async fn revoke(&self, token: &str) -> AuthResult<()> {
        if let Some(s) = self.sessions.lock().unwrap().get_mut(token) {
            s.revoked = true;
        }
        Ok(())
    }

    async fn purge_expired_before(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at >= cutoff);
        Ok((before - sessions.len()) as u64)
    }
}

impl SettingsRepository for MemStore {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.settings.lock().unwrap().get(key).cloned())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

const PASSWORD: &str = "correct horse battery staple";

fn make_user(username: &str, mfa_enabled: bool) -> User {
    let now = Utc::now();
    User {
        user_id: UserId::new(),
        username: username.to_string(),
        password_hash: hash_password(PASSWORD, None).unwrap(),
        mfa_enabled,
        mfa_secret: None,
        is_active: true,
        is_superadmin: false,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn test_config() -> Arc<AuthConfig> {
    let mut config = AuthConfig::with_random_secret();
    // Keep the anti-enumeration delay out of the test wall clock
    config.unknown_user_delay = std::time::Duration::from_millis(1);
    Arc::new(config)
}

fn client() -> ClientInfo {
    ClientInfo {
        ip: Some("203.0.113.9".parse().unwrap()),
        user_agent: Some("test-agent/1.0".to_string()),
    }
}

struct Harness {
    store: Arc<MemStore>,
    config: Arc<AuthConfig>,
}

impl Harness {
    fn new() -> Self {
        Self {
            store: Arc::new(MemStore::default()),
            config: test_config(),
        }
    }

    fn login_use_case(&self) -> LoginUseCase<MemStore, MemStore, MemStore, MemStore> {
        LoginUseCase::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.config.clone(),
        )
    }

    fn verify_use_case(&self) -> VerifyMfaUseCase<MemStore, MemStore> {
        VerifyMfaUseCase::new(self.store.clone(), self.store.clone(), self.config.clone())
    }

    fn enroll_use_case(&self) -> EnrollMfaUseCase<MemStore> {
        EnrollMfaUseCase::new(self.store.clone(), self.config.clone())
    }

    fn check_use_case(&self) -> CheckSessionUseCase<MemStore, MemStore> {
        CheckSessionUseCase::new(self.store.clone(), self.store.clone())
    }

    async fn login(&self, username: &str, password: &str) -> AuthResult<LoginOutcome> {
        self.login_use_case()
            .execute(
                LoginInput {
                    username: username.to_string(),
                    password: password.to_string(),
                },
                client(),
            )
            .await
    }

    fn principal_for(&self, user: &User) -> kernel::principal::Principal {
        kernel::principal::Principal {
            user_id: user.user_id,
            username: user.username.clone(),
            is_superadmin: user.is_superadmin,
            session_token: "test-session".to_string(),
        }
    }
}

fn current_code(secret_b32: &str, issuer: &str, account: &str) -> String {
    let secret = TotpSecret::from_base32(secret_b32.to_string()).unwrap();
    let now = Utc::now().timestamp() as u64;
    secret.code_at(now, issuer, account).unwrap()
}

// ============================================================================
// Login scenarios
// ============================================================================

#[tokio::test]
async fn alice_without_mfa_gets_session_immediately() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));

    let outcome = h.login("alice", PASSWORD).await.unwrap();

    assert_eq!(outcome.redirect_to(), "/");
    let LoginOutcome::SignedIn { session_token } = outcome else {
        panic!("expected immediate session, got {outcome:?}");
    };

    // Session persisted, success event in the ledger, last-login stamped
    assert!(h.store.sessions.lock().unwrap().contains_key(&session_token));
    assert_eq!(h.store.reasons_for("alice"), vec![LoginReason::Ok]);

    let user = h.store.user(&find_user_id(&h, "alice"));
    assert!(user.last_login_at.is_some());
}

fn find_user_id(h: &Harness, username: &str) -> UserId {
    h.store
        .users
        .lock()
        .unwrap()
        .values()
        .find(|u| u.username == username)
        .map(|u| u.user_id)
        .expect("user exists")
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));

    let wrong_password = h.login("alice", "not the password").await.unwrap_err();
    let unknown_user = h.login("nobody", PASSWORD).await.unwrap_err();

    // Same message, same status - only the ledger knows the difference
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    assert_eq!(wrong_password.status_code(), unknown_user.status_code());

    assert_eq!(h.store.reasons_for("alice"), vec![LoginReason::BadPassword]);
    assert_eq!(
        h.store.reasons_for("nobody"),
        vec![LoginReason::NoUserOrInactive]
    );

    // The unknown-username attempt is recorded without a user reference
    let events = h.store.events.lock().unwrap();
    let ghost = events
        .iter()
        .find(|e| e.username_attempted == "nobody")
        .unwrap();
    assert!(ghost.user_id.is_none());
}

#[tokio::test]
async fn inactive_user_rejected_like_unknown() {
    let h = Harness::new();
    let mut user = make_user("dave", false);
    user.is_active = false;
    h.store.insert_user(user);

    let err = h.login("dave", PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(
        h.store.reasons_for("dave"),
        vec![LoginReason::NoUserOrInactive]
    );
}

#[tokio::test]
async fn malformed_stored_hash_fails_closed() {
    let h = Harness::new();
    let mut user = make_user("eve", false);
    user.password_hash = "not-a-phc-string".to_string();
    h.store.insert_user(user);

    let err = h.login("eve", PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(
        h.store.reasons_for("eve"),
        vec![LoginReason::BadStoredHash]
    );
}

#[tokio::test]
async fn carol_locked_after_max_failures_even_with_correct_password() {
    let h = Harness::new();
    h.store.insert_user(make_user("carol", false));

    // Five wrong passwords inside the window
    for _ in 0..5 {
        let err = h.login("carol", "wrong password").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    // Sixth attempt with the *correct* password is rejected as locked
    let err = h.login("carol", PASSWORD).await.unwrap_err();
    let AuthError::Locked { retry_after } = err else {
        panic!("expected lockout, got {err:?}");
    };
    assert!(retry_after > Utc::now());

    // The lockout itself is on the ledger
    let reasons = h.store.reasons_for("carol");
    assert_eq!(reasons.len(), 6);
    assert_eq!(reasons[5], LoginReason::Locked);
}

#[tokio::test]
async fn lockout_policy_loaded_from_settings() {
    let h = Harness::new();
    h.store.insert_user(make_user("carol", false));
    h.store.set_setting(
        LOCKOUT_POLICY_KEY,
        r#"{"window_minutes": 15, "max_attempts": 2, "lock_minutes": 5}"#,
    );

    for _ in 0..2 {
        let _ = h.login("carol", "wrong password").await.unwrap_err();
    }

    let err = h.login("carol", PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::Locked { .. }));
}

#[tokio::test]
async fn unparseable_policy_falls_back_to_defaults() {
    let h = Harness::new();
    h.store.insert_user(make_user("carol", false));
    h.store.set_setting(LOCKOUT_POLICY_KEY, "{{{ broken json");

    // Defaults allow 4 failures without locking
    for _ in 0..4 {
        let _ = h.login("carol", "wrong password").await.unwrap_err();
    }
    assert!(h.login("carol", PASSWORD).await.is_ok());
}

// ============================================================================
// MFA scenarios
// ============================================================================

/// Enroll + confirm MFA for a user, returning the secret.
async fn enroll_mfa(h: &Harness, username: &str) -> String {
    let user = h.store.user(&find_user_id(h, username));
    let principal = h.principal_for(&user);

    let view = h.enroll_use_case().enroll(&principal).await.unwrap();
    let EnrollView::Pending(provisioning) = view else {
        panic!("expected pending enrollment");
    };

    let code = current_code(
        &provisioning.secret_base32,
        &h.config.totp_issuer,
        username,
    );
    let outcome = h.enroll_use_case().confirm(&principal, &code).await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Enabled));

    provisioning.secret_base32
}

#[tokio::test]
async fn bob_with_mfa_must_verify_before_session_exists() {
    let h = Harness::new();
    h.store.insert_user(make_user("bob", false));
    let secret = enroll_mfa(&h, "bob").await;

    let outcome = h.login("bob", PASSWORD).await.unwrap();
    let LoginOutcome::MfaRequired { ticket } = outcome else {
        panic!("expected MFA step, got {outcome:?}");
    };

    // No session yet - only the signed ticket
    assert!(h.store.sessions.lock().unwrap().is_empty());

    // Correct current code turns the ticket into a session
    let code = current_code(&secret, &h.config.totp_issuer, "bob");
    let outcome = h
        .verify_use_case()
        .execute(Some(&ticket), &code, client())
        .await
        .unwrap();

    let MfaOutcome::SignedIn { session_token } = outcome else {
        panic!("expected session, got {outcome:?}");
    };
    assert!(h.store.sessions.lock().unwrap().contains_key(&session_token));
}

#[tokio::test]
async fn wrong_code_keeps_ticket_usable() {
    let h = Harness::new();
    h.store.insert_user(make_user("bob", false));
    let secret = enroll_mfa(&h, "bob").await;

    let LoginOutcome::MfaRequired { ticket } = h.login("bob", PASSWORD).await.unwrap() else {
        panic!("expected MFA step");
    };

    // Wrong code: 401-style rejection, ticket not consumed
    let err = h
        .verify_use_case()
        .execute(Some(&ticket), "000000", client())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidMfaCode));

    // Same ticket still works with the right code
    let code = current_code(&secret, &h.config.totp_issuer, "bob");
    let outcome = h
        .verify_use_case()
        .execute(Some(&ticket), &code, client())
        .await
        .unwrap();
    assert!(matches!(outcome, MfaOutcome::SignedIn { .. }));
}

#[tokio::test]
async fn expired_or_forged_ticket_goes_back_to_login() {
    let h = Harness::new();
    h.store.insert_user(make_user("bob", false));
    enroll_mfa(&h, "bob").await;

    let user_id = find_user_id(&h, "bob");

    // Expired ticket
    let expired = PendingMfaTicket::issue(user_id, "bob", chrono::Duration::seconds(-1))
        .encode(&h.config.ticket_secret);
    let outcome = h
        .verify_use_case()
        .execute(Some(&expired), "123456", client())
        .await
        .unwrap();
    assert!(matches!(outcome, MfaOutcome::BackToLogin));

    // Ticket signed with the wrong key
    let forged =
        PendingMfaTicket::issue(user_id, "bob", chrono::Duration::seconds(600)).encode(&[9u8; 32]);
    let outcome = h
        .verify_use_case()
        .execute(Some(&forged), "123456", client())
        .await
        .unwrap();
    assert!(matches!(outcome, MfaOutcome::BackToLogin));

    // Missing ticket cookie
    let outcome = h
        .verify_use_case()
        .execute(None, "123456", client())
        .await
        .unwrap();
    assert!(matches!(outcome, MfaOutcome::BackToLogin));
}

#[tokio::test]
async fn ticket_for_user_without_secret_is_anonymous() {
    let h = Harness::new();
    let user = make_user("bob", true); // flag set but no secret stored
    let user_id = user.user_id;
    h.store.insert_user(user);

    let ticket = PendingMfaTicket::issue(user_id, "bob", chrono::Duration::seconds(600))
        .encode(&h.config.ticket_secret);
    let outcome = h
        .verify_use_case()
        .execute(Some(&ticket), "123456", client())
        .await
        .unwrap();
    assert!(matches!(outcome, MfaOutcome::BackToLogin));
}

// ============================================================================
// Enrollment scenarios
// ============================================================================

#[tokio::test]
async fn enrollment_is_observe_then_confirm() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));
    let user_id = find_user_id(&h, "alice");
    let principal = h.principal_for(&h.store.user(&user_id));

    // First visit creates a pending, disabled secret
    let EnrollView::Pending(first) = h.enroll_use_case().enroll(&principal).await.unwrap() else {
        panic!("expected pending enrollment");
    };
    let stored = h.store.user(&user_id);
    assert!(!stored.mfa_enabled);
    assert_eq!(stored.mfa_secret.as_deref(), Some(first.secret_base32.as_str()));
    assert!(first.otpauth_url.starts_with("otpauth://totp/"));
    assert!(!first.qr_png_base64.is_empty());

    // Re-visiting does not rotate the pending secret
    let EnrollView::Pending(second) = h.enroll_use_case().enroll(&principal).await.unwrap() else {
        panic!("expected pending enrollment");
    };
    assert_eq!(first.secret_base32, second.secret_base32);
}

#[tokio::test]
async fn failed_confirmation_keeps_the_same_secret() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));
    let user_id = find_user_id(&h, "alice");
    let principal = h.principal_for(&h.store.user(&user_id));

    let EnrollView::Pending(provisioning) = h.enroll_use_case().enroll(&principal).await.unwrap()
    else {
        panic!("expected pending enrollment");
    };

    // Wrong code: rejected, flag stays off, same material re-presented
    let outcome = h
        .enroll_use_case()
        .confirm(&principal, "000000")
        .await
        .unwrap();
    let ConfirmOutcome::Rejected(re_presented) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(re_presented.secret_base32, provisioning.secret_base32);
    assert!(!h.store.user(&user_id).mfa_enabled);

    // Right code against the same secret succeeds
    let code = current_code(&provisioning.secret_base32, &h.config.totp_issuer, "alice");
    let outcome = h.enroll_use_case().confirm(&principal, &code).await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Enabled));
    assert!(h.store.user(&user_id).mfa_enabled);
}

#[tokio::test]
async fn enroll_is_idempotent_once_enabled() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));
    let secret = enroll_mfa(&h, "alice").await;

    let user_id = find_user_id(&h, "alice");
    let principal = h.principal_for(&h.store.user(&user_id));

    // The enrolled secret must survive another enroll call untouched
    let view = h.enroll_use_case().enroll(&principal).await.unwrap();
    assert!(matches!(view, EnrollView::AlreadyEnabled));
    assert_eq!(h.store.user(&user_id).mfa_secret.as_deref(), Some(secret.as_str()));
}

#[tokio::test]
async fn disable_own_mfa_clears_flag_and_secret_together() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));
    enroll_mfa(&h, "alice").await;

    let user_id = find_user_id(&h, "alice");
    let principal = h.principal_for(&h.store.user(&user_id));

    h.enroll_use_case()
        .disable(&principal, &user_id)
        .await
        .unwrap();

    let user = h.store.user(&user_id);
    assert!(!user.mfa_enabled);
    assert!(user.mfa_secret.is_none());
}

#[tokio::test]
async fn disabling_someone_elses_mfa_is_forbidden() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));
    h.store.insert_user(make_user("mallory", false));
    enroll_mfa(&h, "alice").await;

    let alice_id = find_user_id(&h, "alice");
    let mallory = h.store.user(&find_user_id(&h, "mallory"));
    let principal = h.principal_for(&mallory);

    let err = h
        .enroll_use_case()
        .disable(&principal, &alice_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden));

    // Alice untouched
    let alice = h.store.user(&alice_id);
    assert!(alice.mfa_enabled);
    assert!(alice.mfa_secret.is_some());
}

// ============================================================================
// Session enforcement scenarios
// ============================================================================

#[tokio::test]
async fn enforce_yields_principal_and_touches_activity() {
    let h = Harness::new();
    let mut user = make_user("alice", false);
    user.is_superadmin = true;
    h.store.insert_user(user);

    let LoginOutcome::SignedIn { session_token } = h.login("alice", PASSWORD).await.unwrap()
    else {
        panic!("expected session");
    };

    let principal = h.check_use_case().enforce(&session_token).await.unwrap();
    assert_eq!(principal.username, "alice");
    assert!(principal.is_superadmin);
    assert_eq!(principal.session_token, session_token);
}

#[tokio::test]
async fn enforce_rejects_unknown_and_revoked_tokens() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));

    let err = h.check_use_case().enforce("no-such-token").await.unwrap_err();
    assert!(matches!(err, AuthError::SessionInvalid));

    let LoginOutcome::SignedIn { session_token } = h.login("alice", PASSWORD).await.unwrap()
    else {
        panic!("expected session");
    };

    // Logout revokes; the token dies but the row survives for audit
    SignOutUseCase::new(h.store.clone())
        .execute(&session_token)
        .await
        .unwrap();
    // Idempotent on the second call
    SignOutUseCase::new(h.store.clone())
        .execute(&session_token)
        .await
        .unwrap();

    let err = h.check_use_case().enforce(&session_token).await.unwrap_err();
    assert!(matches!(err, AuthError::SessionInvalid));
    assert!(h.store.sessions.lock().unwrap().contains_key(&session_token));
}

#[tokio::test]
async fn enforce_revokes_on_expiry() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));

    let LoginOutcome::SignedIn { session_token } = h.login("alice", PASSWORD).await.unwrap()
    else {
        panic!("expected session");
    };

    // Force the session past its absolute expiry
    {
        let mut sessions = h.store.sessions.lock().unwrap();
        let s = sessions.get_mut(&session_token).unwrap();
        s.expires_at = Utc::now() - chrono::Duration::seconds(1);
    }

    let err = h.check_use_case().enforce(&session_token).await.unwrap_err();
    assert!(matches!(err, AuthError::SessionInvalid));
    assert!(h.store.sessions.lock().unwrap()[&session_token].revoked);
}

#[tokio::test]
async fn enforce_revokes_on_idle_timeout() {
    let h = Harness::new();
    h.store.insert_user(make_user("alice", false));

    let LoginOutcome::SignedIn { session_token } = h.login("alice", PASSWORD).await.unwrap()
    else {
        panic!("expected session");
    };

    {
        let mut sessions = h.store.sessions.lock().unwrap();
        let s = sessions.get_mut(&session_token).unwrap();
        s.last_active_at = Utc::now() - chrono::Duration::seconds(s.idle_timeout_seconds + 5);
    }

    let err = h.check_use_case().enforce(&session_token).await.unwrap_err();
    assert!(matches!(err, AuthError::SessionInvalid));
    assert!(h.store.sessions.lock().unwrap()[&session_token].revoked);
}
