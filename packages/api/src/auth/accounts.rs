//! # Local account directory
//!
//! [`AccountDirectory`] validates signups and logins against the account list
//! kept in the [`LocalCache`]. It never touches the active-user pointer or the
//! note collections; [`crate::Workspace`] sequences those around it.
//!
//! ## Signup rules (checked in this order, nothing is written on rejection)
//!
//! 1. Username, trimmed, must be non-empty.
//! 2. Password must be at least `min_password_length` characters (default 6).
//! 3. Password and confirmation must match.
//! 4. Username must not be the guest namespace (`guest`, any casing) and must
//!    not exist yet, both compared case-insensitively.
//!
//! Passwords are stored as Argon2id hashes. Directories written by older builds
//! may still carry a plaintext `password`; the first successful login replaces
//! it with a hash.

use store::config::AccountsConfig;
use store::{Account, AccountPatch, KeyValueStore, LocalCache, GUEST};

use super::password::{hash_password, verify_password};
use super::AuthError;

/// Fields of the signup form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub confirm: String,
    pub email: Option<String>,
}

impl SignupForm {
    pub fn new(username: &str, password: &str, confirm: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            confirm: confirm.to_string(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }
}

fn is_reserved(username: &str) -> bool {
    username.trim().eq_ignore_ascii_case(GUEST)
}

/// Signup/login checks over the cached account list.
pub struct AccountDirectory<'a, S: KeyValueStore> {
    cache: &'a LocalCache<S>,
    rules: &'a AccountsConfig,
}

impl<'a, S: KeyValueStore> AccountDirectory<'a, S> {
    pub fn new(cache: &'a LocalCache<S>, rules: &'a AccountsConfig) -> Self {
        Self { cache, rules }
    }

    /// Case-insensitive lookup.
    pub async fn find(&self, username: &str) -> Option<Account> {
        self.cache
            .accounts()
            .await
            .into_iter()
            .find(|a| a.matches(username))
    }

    /// Validate `form` and append a new account.
    pub async fn register(&self, form: &SignupForm) -> Result<Account, AuthError> {
        let username = form.username.trim();
        if username.is_empty() {
            return Err(AuthError::UsernameRequired);
        }
        if form.password.chars().count() < self.rules.min_password_length {
            return Err(AuthError::PasswordTooShort {
                min: self.rules.min_password_length,
            });
        }
        if form.password != form.confirm {
            return Err(AuthError::PasswordMismatch);
        }

        if is_reserved(username) {
            return Err(AuthError::UsernameReserved);
        }
        let mut accounts = self.cache.accounts().await;
        if accounts.iter().any(|a| a.matches(username)) {
            return Err(AuthError::UsernameTaken);
        }

        let account = Account {
            username: username.to_string(),
            password_hash: hash_password(&form.password)?,
            legacy_password: None,
            email: form
                .email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            avatar: None,
            description: None,
        };
        accounts.push(account.clone());
        self.cache.set_accounts(&accounts).await?;
        tracing::info!("registered account {}", account.username);
        Ok(account)
    }

    /// Check credentials. Returns the stored account (with its original casing).
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        // Older directories may hold a `guest` account; it can never own a namespace.
        if is_reserved(username) {
            return Err(AuthError::UsernameReserved);
        }
        let mut accounts = self.cache.accounts().await;
        let Some(index) = accounts.iter().position(|a| a.matches(username)) else {
            return Err(AuthError::AccountNotFound);
        };

        if !accounts[index].password_hash.is_empty() {
            if !verify_password(password, &accounts[index].password_hash)? {
                return Err(AuthError::IncorrectPassword);
            }
            return Ok(accounts.swap_remove(index));
        }

        if accounts[index].legacy_password.as_deref() != Some(password) {
            return Err(AuthError::IncorrectPassword);
        }

        let account = &mut accounts[index];
        account.password_hash = hash_password(password)?;
        account.legacy_password = None;
        let upgraded = account.clone();
        if let Err(e) = self.cache.set_accounts(&accounts).await {
            tracing::warn!(
                "could not rehash legacy password for {}: {}",
                upgraded.username,
                e
            );
        }
        Ok(upgraded)
    }

    /// Overwrite the fields set in `patch`. Returns whether the account exists.
    pub async fn update(&self, username: &str, patch: AccountPatch) -> Result<bool, AuthError> {
        let mut accounts = self.cache.accounts().await;
        let Some(account) = accounts.iter_mut().find(|a| a.matches(username)) else {
            return Ok(false);
        };
        if let Some(email) = patch.email {
            account.email = Some(email);
        }
        if let Some(avatar) = patch.avatar {
            account.avatar = Some(avatar);
        }
        if let Some(description) = patch.description {
            account.description = Some(description);
        }
        self.cache.set_accounts(&accounts).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{MemoryStore, WorkspaceConfig};

    fn setup() -> (LocalCache<MemoryStore>, MemoryStore, WorkspaceConfig) {
        let store = MemoryStore::new();
        let config = WorkspaceConfig::default();
        (LocalCache::new(store.clone(), &config), store, config)
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let (cache, _, config) = setup();
        let dir = AccountDirectory::new(&cache, &config.accounts);

        let form = SignupForm::new(" Alice ", "secret1", "secret1").with_email(" a@x.io ");
        let account = dir.register(&form).await.unwrap();
        assert_eq!(account.username, "Alice");
        assert_eq!(account.email.as_deref(), Some("a@x.io"));
        assert_ne!(account.password_hash, "secret1");

        let found = dir.authenticate("alice", "secret1").await.unwrap();
        assert_eq!(found.username, "Alice");

        assert!(matches!(
            dir.authenticate("alice", "nope").await,
            Err(AuthError::IncorrectPassword)
        ));
        assert!(matches!(
            dir.authenticate("bob", "secret1").await,
            Err(AuthError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn test_register_validation_leaves_directory_untouched() {
        let (cache, store, config) = setup();
        let dir = AccountDirectory::new(&cache, &config.accounts);
        dir.register(&SignupForm::new("Alice", "secret1", "secret1"))
            .await
            .unwrap();
        let key = cache.keys().accounts_key();
        let before = store.get(&key).await;

        let cases = [
            (SignupForm::new("  ", "secret1", "secret1"), "Please enter a username."),
            (
                SignupForm::new("bob", "12345", "12345"),
                "Password must be at least 6 characters.",
            ),
            (SignupForm::new("bob", "secret1", "secret2"), "Passwords do not match."),
            (SignupForm::new("ALICE", "secret1", "secret1"), "That username is already taken."),
            (SignupForm::new(" Guest ", "secret1", "secret1"), "That username is reserved."),
        ];
        for (form, message) in cases {
            let err = dir.register(&form).await.unwrap_err();
            assert_eq!(err.to_string(), message);
        }

        assert_eq!(store.get(&key).await, before);
        assert_eq!(cache.accounts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_guest_name_is_reserved() {
        let (cache, store, config) = setup();
        let dir = AccountDirectory::new(&cache, &config.accounts);
        for name in ["guest", "GUEST", " Guest "] {
            assert!(matches!(
                dir.register(&SignupForm::new(name, "secret1", "secret1")).await,
                Err(AuthError::UsernameReserved)
            ));
        }
        assert!(cache.accounts().await.is_empty());

        // A directory written before the rule still cannot log into the guest namespace
        let legacy = r#"[{"username":"guest","password":"secret1"}]"#;
        store
            .set(&cache.keys().accounts_key(), legacy.into())
            .await
            .unwrap();
        assert!(matches!(
            dir.authenticate("guest", "secret1").await,
            Err(AuthError::UsernameReserved)
        ));
    }

    #[tokio::test]
    async fn test_configured_minimum_length() {
        let (cache, _, _) = setup();
        let config = WorkspaceConfig::default().with_min_password_length(10);
        let dir = AccountDirectory::new(&cache, &config.accounts);
        assert!(matches!(
            dir.register(&SignupForm::new("bob", "short-pw", "short-pw")).await,
            Err(AuthError::PasswordTooShort { min: 10 })
        ));
    }

    #[tokio::test]
    async fn test_legacy_plaintext_is_rehashed_on_login() {
        let (cache, store, config) = setup();
        store
            .set(
                &cache.keys().accounts_key(),
                r#"[{"username":"Old","password":"legacy1"}]"#.into(),
            )
            .await
            .unwrap();
        let dir = AccountDirectory::new(&cache, &config.accounts);

        assert!(matches!(
            dir.authenticate("old", "wrong").await,
            Err(AuthError::IncorrectPassword)
        ));

        let account = dir.authenticate("old", "legacy1").await.unwrap();
        assert!(account.password_hash.starts_with("$argon2id$"));

        let raw = store.get(&cache.keys().accounts_key()).await.unwrap();
        assert!(!raw.contains("legacy1"));
        dir.authenticate("OLD", "legacy1").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_account_details() {
        let (cache, _, config) = setup();
        let dir = AccountDirectory::new(&cache, &config.accounts);
        dir.register(&SignupForm::new("Alice", "secret1", "secret1"))
            .await
            .unwrap();

        let patch = AccountPatch {
            avatar: Some("data:image/png;base64,AAA".into()),
            ..Default::default()
        };
        assert!(dir.update("ALICE", patch.clone()).await.unwrap());
        assert!(!dir.update("nobody", patch).await.unwrap());

        let alice = dir.find("alice").await.unwrap();
        assert_eq!(alice.avatar.as_deref(), Some("data:image/png;base64,AAA"));
        assert!(alice.email.is_none());
    }
}
