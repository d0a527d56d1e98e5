//! # cm-api Handlers
//!
//! This module coordinates the flow between HTML requests and Core operations.

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use chrono::Utc;
use cm_core::forms::{CarFields, CommentFields, LoginForm, RegistrationForm};
use cm_core::policy::{is_owner_or_read_only, Access};
use cm_core::service;
use cm_core::traits::{AuthProvider, CarRepo, UserRepo};
use cm_core::{AppError, CarId, FieldErrors};
use cm_ui::{
    CarConfirmDeleteTemplate, CarDetailTemplate, CarFormTemplate, CarFormValues, CarListTemplate, LoginTemplate,
    RegisterTemplate,
};
use serde::Deserialize;

use crate::error::PageError;
use crate::session::{page_requester, safe_next, session_token, SessionPolicy};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub cars: Box<dyn CarRepo>,
    pub users: Box<dyn UserRepo>,
    pub auth: Box<dyn AuthProvider>,
    pub session: SessionPolicy,
}

type PageResult = Result<HttpResponse, PageError>;

fn html<T: Template>(page: T) -> PageResult {
    let body = page
        .render()
        .map_err(|e| AppError::Internal(format!("template rendering failed: {e}")))?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body))
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Where anonymous visitors of login-only pages are sent.
fn login_redirect(req: &HttpRequest) -> HttpResponse {
    redirect(&format!("/login/?next={}", req.path()))
}

/// Renders the car list (`/`).
pub async fn car_list(req: HttpRequest, data: web::Data<AppState>) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    let cars = service::list_cars(&*data.cars).await?;
    html(CarListTemplate {
        current_user: requester.username(),
        cars: &cars,
    })
}

/// Renders a car with its comments (`/car/{id}/`).
pub async fn car_detail(req: HttpRequest, data: web::Data<AppState>, path: web::Path<CarId>) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    let (car, comments) = service::car_with_comments(&*data.cars, path.into_inner()).await?;
    html(CarDetailTemplate {
        current_user: requester.username(),
        can_edit: is_owner_or_read_only(&requester, &car, Access::Unsafe),
        car: &car,
        comments: &comments,
    })
}

/// Comment form post on the detail page. Anonymous posts and bodies that are
/// not a urlencoded form are dropped, but every post lands back on the detail page.
pub async fn car_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<CarId>,
    form: Option<web::Form<CommentFields>>,
) -> PageResult {
    let car_id = path.into_inner();
    let requester = page_requester(&req, &data).await?;
    let fields = form.map(web::Form::into_inner).unwrap_or_default();
    if let Some((car, comment)) = service::comment_from_detail_page(&*data.cars, &requester, car_id, &fields).await? {
        log::info!("{} (id {})", comment.describe(&car), comment.id);
    }
    Ok(redirect(&format!("/car/{car_id}/")))
}

pub async fn car_create_form(req: HttpRequest, data: web::Data<AppState>) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    if !requester.is_authenticated() {
        return Ok(login_redirect(&req));
    }
    html(CarFormTemplate {
        current_user: requester.username(),
        heading: "Add car",
        action: "/car/new/",
        values: CarFormValues::default(),
        errors: &FieldErrors::new(),
    })
}

pub async fn car_create(req: HttpRequest, data: web::Data<AppState>, form: web::Form<CarFields>) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    if !requester.is_authenticated() {
        return Ok(login_redirect(&req));
    }
    match service::create_car(&*data.cars, &requester, &form).await {
        Ok(car) => {
            log::info!("car {} created by {}", car.id, car.owner);
            Ok(redirect("/"))
        }
        Err(AppError::ValidationError(errors)) => html(CarFormTemplate {
            current_user: requester.username(),
            heading: "Add car",
            action: "/car/new/",
            values: echo(&form),
            errors: &errors,
        }),
        Err(other) => Err(other.into()),
    }
}

pub async fn car_update_form(req: HttpRequest, data: web::Data<AppState>, path: web::Path<CarId>) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    if !requester.is_authenticated() {
        return Ok(login_redirect(&req));
    }
    let car = service::owned_car(&*data.cars, &requester, path.into_inner()).await?;
    let action = format!("/car/{}/edit/", car.id);
    html(CarFormTemplate {
        current_user: requester.username(),
        heading: "Edit car",
        action: &action,
        values: CarFormValues::from(&cm_core::CarInput::from(&car)),
        errors: &FieldErrors::new(),
    })
}

pub async fn car_update(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<CarId>,
    form: web::Form<CarFields>,
) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    if !requester.is_authenticated() {
        return Ok(login_redirect(&req));
    }
    let id = path.into_inner();
    match service::update_owned_car(&*data.cars, &requester, id, &form).await {
        Ok(car) => {
            log::info!("car {} updated by {}", car.id, car.owner);
            Ok(redirect("/"))
        }
        Err(AppError::ValidationError(errors)) => {
            let action = format!("/car/{id}/edit/");
            html(CarFormTemplate {
                current_user: requester.username(),
                heading: "Edit car",
                action: &action,
                values: echo(&form),
                errors: &errors,
            })
        }
        Err(other) => Err(other.into()),
    }
}

pub async fn car_delete_confirm(req: HttpRequest, data: web::Data<AppState>, path: web::Path<CarId>) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    if !requester.is_authenticated() {
        return Ok(login_redirect(&req));
    }
    let car = service::owned_car(&*data.cars, &requester, path.into_inner()).await?;
    html(CarConfirmDeleteTemplate {
        current_user: requester.username(),
        car: &car,
    })
}

pub async fn car_delete(req: HttpRequest, data: web::Data<AppState>, path: web::Path<CarId>) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    if !requester.is_authenticated() {
        return Ok(login_redirect(&req));
    }
    let id = path.into_inner();
    service::delete_owned_car(&*data.cars, &requester, id).await?;
    log::info!("car {} deleted by {}", id, requester.username().unwrap_or_default());
    Ok(redirect("/"))
}

pub async fn register_form(req: HttpRequest, data: web::Data<AppState>) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    html(RegisterTemplate {
        current_user: requester.username(),
        username: "",
        email: "",
        errors: &FieldErrors::new(),
    })
}

/// Creates the account, logs it in and goes to the car list.
pub async fn register(data: web::Data<AppState>, form: web::Form<RegistrationForm>) -> PageResult {
    match service::register(&*data.users, &*data.auth, &form).await {
        Ok(user) => {
            let token = service::open_session(&*data.users, &*data.auth, &user, data.session.ttl, Utc::now()).await?;
            log::info!("registered user {}", user.username);
            Ok(HttpResponse::SeeOther()
                .insert_header((header::LOCATION, "/"))
                .cookie(data.session.cookie(token))
                .finish())
        }
        Err(AppError::ValidationError(errors)) => html(RegisterTemplate {
            current_user: None,
            username: &form.username,
            email: &form.email,
            errors: &errors,
        }),
        Err(other) => Err(other.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn login_form(req: HttpRequest, data: web::Data<AppState>, query: web::Query<NextQuery>) -> PageResult {
    let requester = page_requester(&req, &data).await?;
    html(LoginTemplate {
        current_user: requester.username(),
        username: "",
        next: safe_next(query.next.as_deref()),
        errors: &FieldErrors::new(),
    })
}

pub async fn login(data: web::Data<AppState>, form: web::Form<LoginForm>) -> PageResult {
    let next = safe_next(form.next.as_deref());
    match service::authenticate(&*data.users, &*data.auth, &form).await {
        Ok(user) => {
            let token = service::open_session(&*data.users, &*data.auth, &user, data.session.ttl, Utc::now()).await?;
            log::info!("user {} logged in", user.username);
            Ok(HttpResponse::SeeOther()
                .insert_header((header::LOCATION, next))
                .cookie(data.session.cookie(token))
                .finish())
        }
        Err(AppError::ValidationError(errors)) => html(LoginTemplate {
            current_user: None,
            username: &form.username,
            next,
            errors: &errors,
        }),
        Err(other) => Err(other.into()),
    }
}

/// Ends the session (if any) and returns to the car list.
pub async fn logout(req: HttpRequest, data: web::Data<AppState>) -> PageResult {
    if let Some(token) = session_token(&req, &data) {
        service::close_session(&*data.users, &*data.auth, &token).await?;
        log::info!("session closed");
    }
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .cookie(data.session.removal_cookie())
        .finish())
}

/// Submitted values, echoed back into a re-rendered form.
fn echo(fields: &CarFields) -> CarFormValues {
    CarFormValues {
        make: fields.make.clone().unwrap_or_default(),
        model: fields.model.clone().unwrap_or_default(),
        year: fields.year.clone().unwrap_or_default(),
        description: fields.description.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_core::Requester;

    #[test]
    fn echo_keeps_raw_values() {
        let fields = CarFields {
            make: Some("Ford".into()),
            model: None,
            year: Some("soon".into()),
            description: None,
        };
        let values = echo(&fields);
        assert_eq!(values.make, "Ford");
        assert_eq!(values.model, "");
        assert_eq!(values.year, "soon");
    }

    #[test]
    fn anonymous_requester_has_no_username() {
        assert_eq!(Requester::Anonymous.username(), None);
    }
}
