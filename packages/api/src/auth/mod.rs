//! Local account directory, password hashing and remote endpoint config.

mod accounts;
#[cfg(feature = "remote")]
mod config;
mod password;

pub use accounts::{AccountDirectory, SignupForm};
#[cfg(feature = "remote")]
pub use config::RemoteConfig;
pub use password::{hash_password, verify_password};

use thiserror::Error;

/// Rejected signup/login attempts. `Display` is the message shown to the user.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please enter a username.")]
    UsernameRequired,

    #[error("Password must be at least {min} characters.")]
    PasswordTooShort { min: usize },

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("That username is already taken.")]
    UsernameTaken,

    #[error("That username is reserved.")]
    UsernameReserved,

    #[error("Account not found. Create one below.")]
    AccountNotFound,

    #[error("Incorrect password. Try again.")]
    IncorrectPassword,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Storage(#[from] store::StoreError),
}
