//! # Ownership Policy
//!
//! Reads are open to everyone; writes only to the record's owner.

use crate::models::{Car, Comment, Requester, UserId};

/// Classification of a requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Retrieval or listing
    Safe,
    /// Create, update or delete
    Unsafe,
}

impl Access {
    /// `GET`, `HEAD` and `OPTIONS` are safe; every other method is not.
    pub fn from_method(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" | "HEAD" | "OPTIONS" => Access::Safe,
            _ => Access::Unsafe,
        }
    }
}

/// Anything with a single responsible user.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

impl Owned for Car {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> UserId {
        self.author_id
    }
}

/// Object-level permission check.
pub fn is_owner_or_read_only<R: Owned + ?Sized>(requester: &Requester, resource: &R, access: Access) -> bool {
    match access {
        Access::Safe => true,
        Access::Unsafe => requester.user_id() == Some(resource.owner_id()),
    }
}
