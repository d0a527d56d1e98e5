//! Shared fixtures: an in-memory database, fast Argon2 parameters, and
//! helpers to create accounts and sessions without going through HTTP.
#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::web;
use argon2::Params;
use base64::Engine;
use chrono::{Duration, Utc};
use cm_api::{AppState, SessionPolicy};
use cm_auth_simple::SimpleAuthProvider;
use cm_core::forms::{CarFields, CommentFields, RegistrationForm};
use cm_core::{service, Car, CarId, CarRepo, Comment, Requester, User};
use cm_db_sqlite::SqliteRepo;

pub const PASSWORD: &str = "tr0ub4dor-and-3";

/// Builds the app around the given state.
macro_rules! app {
    ($env:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($env.data.clone())
                .configure(cm_api::configure_routes),
        )
        .await
    };
}

pub struct TestEnv {
    pub data: web::Data<AppState>,
    pub repo: SqliteRepo,
}

fn fast_auth() -> SimpleAuthProvider {
    let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None).unwrap();
    SimpleAuthProvider::with_params("test-salt", params)
}

pub async fn env() -> TestEnv {
    let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
    let data = web::Data::new(AppState {
        cars: Box::new(repo.clone()),
        users: Box::new(repo.clone()),
        auth: Box::new(fast_auth()),
        session: SessionPolicy::default(),
    });
    TestEnv { data, repo }
}

impl TestEnv {
    pub async fn user(&self, username: &str) -> User {
        let form = RegistrationForm {
            username: username.into(),
            email: format!("{username}@example.com"),
            password1: PASSWORD.into(),
            password2: PASSWORD.into(),
        };
        service::register(&self.repo, &*self.data.auth, &form).await.unwrap()
    }

    /// Session cookie for `user`.
    pub async fn login(&self, user: &User) -> Cookie<'static> {
        let token = service::open_session(&self.repo, &*self.data.auth, user, Duration::days(1), Utc::now())
            .await
            .unwrap();
        self.data.session.cookie(token)
    }

    pub async fn car(&self, owner: &User, make: &str) -> Car {
        let fields = CarFields {
            make: Some(make.into()),
            model: Some("Model".into()),
            year: Some("2020".into()),
            description: Some("Well kept".into()),
        };
        service::create_car(&self.repo, &Requester::from_user(owner), &fields).await.unwrap()
    }

    pub async fn comment(&self, author: &User, car_id: CarId, content: &str) -> Comment {
        service::create_comment(&self.repo, &Requester::from_user(author), car_id, &CommentFields::new(content))
            .await
            .unwrap()
    }

    pub async fn cars(&self) -> Vec<Car> {
        self.repo.list_cars().await.unwrap()
    }

    pub async fn comments(&self, car_id: CarId) -> Vec<Comment> {
        self.repo.list_comments(car_id).await.unwrap()
    }
}

/// `Authorization` header value for HTTP Basic.
pub fn basic(username: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}
