pub mod password;
pub mod token;

pub use password::{generate_salt, hash_password, verify_password};
pub use token::{issue_token, verify_token, session_cookie, clear_session_cookie, SESSION_COOKIE};
