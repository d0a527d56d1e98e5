//! # Domain Models
//!
//! These structs represent the core entities of the car catalogue.
//! Identifiers are store-assigned integers, matching the `/car/{id}/` URLs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type CarId = i64;
pub type CommentId = i64;

/// A registered account. Only the id and username matter to the rest of the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// A car record. `owner` carries the owner's username for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Car {
    pub id: CarId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: UserId,
    pub owner: String,
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.year, self.make, self.model)
    }
}

/// A comment attached to a car. Immutable apart from `content`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub car_id: CarId,
    pub author_id: UserId,
    pub author: String,
}

impl Comment {
    /// e.g. "Comment by alice on 2020 Toyota Camry"
    pub fn describe(&self, car: &Car) -> String {
        format!("Comment by {} on {}", self.author, car)
    }
}

/// Validated, writable car fields. Owner and timestamps are never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarInput {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub description: String,
}

impl From<&Car> for CarInput {
    fn from(car: &Car) -> Self {
        Self {
            make: car.make.clone(),
            model: car.model.clone(),
            year: car.year,
            description: car.description.clone(),
        }
    }
}

/// Validated account fields; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Server-side record of a login. Only a digest of the cookie token is stored.
#[derive(Debug, Clone)]
pub struct Session {
    pub token_digest: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Identity of the caller of a request-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    Authenticated { id: UserId, username: String },
}

impl Requester {
    pub fn from_user(user: &User) -> Self {
        Requester::Authenticated {
            id: user.id,
            username: user.username.clone(),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Requester::Anonymous => None,
            Requester::Authenticated { id, .. } => Some(*id),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Requester::Anonymous => None,
            Requester::Authenticated { username, .. } => Some(username),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Requester::Authenticated { .. })
    }
}
