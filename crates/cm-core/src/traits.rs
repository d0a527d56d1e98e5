//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::models::{Car, CarId, CarInput, Comment, CommentId, NewUser, Session, User, UserId};

/// Data persistence contract for cars and their comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CarRepo: Send + Sync {
    // Car Operations
    async fn list_cars(&self) -> anyhow::Result<Vec<Car>>;
    async fn get_car(&self, id: CarId) -> anyhow::Result<Option<Car>>;
    /// Lookup restricted to cars owned by `owner_id`.
    async fn get_car_owned_by(&self, id: CarId, owner_id: UserId) -> anyhow::Result<Option<Car>>;
    async fn insert_car(&self, owner_id: UserId, input: &CarInput) -> anyhow::Result<Car>;
    /// Rewrites the writable fields and bumps `updated_at`.
    async fn update_car(&self, id: CarId, input: &CarInput) -> anyhow::Result<Option<Car>>;
    /// Removes the car and, through the schema, its comments.
    async fn delete_car(&self, id: CarId) -> anyhow::Result<bool>;

    // Comment Operations
    /// Comments of one car, newest first.
    async fn list_comments(&self, car_id: CarId) -> anyhow::Result<Vec<Comment>>;
    async fn get_comment(&self, car_id: CarId, id: CommentId) -> anyhow::Result<Option<Comment>>;
    async fn insert_comment(&self, car_id: CarId, author_id: UserId, content: &str) -> anyhow::Result<Comment>;
    async fn update_comment(&self, id: CommentId, content: &str) -> anyhow::Result<Option<Comment>>;
    async fn delete_comment(&self, id: CommentId) -> anyhow::Result<bool>;
}

/// Account and session persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert_user(&self, user: &NewUser) -> anyhow::Result<User>;
    async fn get_user(&self, id: UserId) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    async fn insert_session(&self, session: &Session) -> anyhow::Result<()>;
    async fn get_session(&self, token_digest: &str) -> anyhow::Result<Option<Session>>;
    async fn delete_session(&self, token_digest: &str) -> anyhow::Result<()>;
}

/// Credential and session-token contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Produces a PHC string for storage.
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored PHC string.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Fresh opaque token handed to the client.
    fn generate_session_token(&self) -> anyhow::Result<String>;

    /// Digest under which a token is stored server-side.
    fn digest_session_token(&self, token: &str) -> String;
}
