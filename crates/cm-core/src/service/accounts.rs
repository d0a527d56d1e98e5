//! Registration, login and session lifecycle.

use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, FieldErrors, Result};
use crate::forms::{invalid_login, LoginForm, RegistrationForm};
use crate::models::{NewUser, Requester, Session, User};
use crate::traits::{AuthProvider, UserRepo};

/// Validates the form, rejects taken usernames, stores the hashed password.
pub async fn register(users: &dyn UserRepo, auth: &dyn AuthProvider, form: &RegistrationForm) -> Result<User> {
    form.validate()?;
    let username = form.username.trim();

    if users.find_user_by_username(username).await?.is_some() {
        let mut errors = FieldErrors::new();
        errors.add("username", "A user with that username already exists.");
        return Err(errors.into());
    }

    let password_hash = auth.hash_password(&form.password1)?;
    let user = users
        .insert_user(&NewUser {
            username: username.to_string(),
            email: form.email.trim().to_string(),
            password_hash,
        })
        .await?;
    Ok(user)
}

/// Checks a username/password pair. Wrong pairs are a validation error on the form.
pub async fn authenticate(users: &dyn UserRepo, auth: &dyn AuthProvider, form: &LoginForm) -> Result<User> {
    form.validate()?;
    let user = users
        .find_user_by_username(form.username.trim())
        .await?
        .ok_or_else(|| AppError::ValidationError(invalid_login()))?;

    if auth.verify_password(&form.password, &user.password_hash).await {
        Ok(user)
    } else {
        Err(AppError::ValidationError(invalid_login()))
    }
}

/// Starts a session for `user` and returns the raw token for the cookie.
pub async fn open_session(
    users: &dyn UserRepo,
    auth: &dyn AuthProvider,
    user: &User,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String> {
    let token = auth.generate_session_token()?;
    users
        .insert_session(&Session {
            token_digest: auth.digest_session_token(&token),
            user_id: user.id,
            created_at: now,
            expires_at: now + ttl,
        })
        .await?;
    Ok(token)
}

/// Maps a cookie token to the requester. Unknown or expired tokens are anonymous.
pub async fn resolve_session(
    users: &dyn UserRepo,
    auth: &dyn AuthProvider,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Requester> {
    let digest = auth.digest_session_token(token);
    let Some(session) = users.get_session(&digest).await? else {
        return Ok(Requester::Anonymous);
    };
    if session.is_expired(now) {
        users.delete_session(&digest).await?;
        return Ok(Requester::Anonymous);
    }
    Ok(users
        .get_user(session.user_id)
        .await?
        .map(|user| Requester::from_user(&user))
        .unwrap_or(Requester::Anonymous))
}

pub async fn close_session(users: &dyn UserRepo, auth: &dyn AuthProvider, token: &str) -> Result<()> {
    users.delete_session(&auth.digest_session_token(token)).await?;
    Ok(())
}
