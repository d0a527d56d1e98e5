//! # Resource Operations
//!
//! Request-scoped operations shared by the HTML pages and the JSON API.
//! Every call receives the store handle and the requester explicitly.

pub mod accounts;
pub mod cars;
pub mod comments;

pub use accounts::*;
pub use cars::*;
pub use comments::*;

use crate::error::{AppError, Result};
use crate::models::{Requester, UserId};

/// The requester's user id, or `AuthenticationRequired`.
pub fn require_user(requester: &Requester) -> Result<UserId> {
    requester.user_id().ok_or(AppError::AuthenticationRequired)
}
