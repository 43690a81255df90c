//! Accounts: normalized usernames, password hashing and the account directory.

mod directory;
mod password;
mod username;

pub use directory::{
    account_exists, check_password, create_account, create_account_table, get_password_hash,
    verify_credentials,
};
pub use password::{MIN_PASSWORD_LENGTH, PasswordHash, ValidatedPassword};
pub use username::{MAX_USERNAME_LENGTH, Username};
