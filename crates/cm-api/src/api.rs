//! # JSON API
//!
//! `/api/cars/` and `/api/cars/{car_id}/comments/`. Reads are open; writes
//! need a session cookie or Basic credentials, and the ownership policy is
//! applied after a global lookup.

use actix_web::error::InternalError;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use cm_core::forms::{CarFields, CommentFields};
use cm_core::policy::Access;
use cm_core::service;
use cm_core::{Car, CarId, Comment, CommentId};
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::session::api_requester;

type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Serialize)]
pub struct CommentResource {
    pub id: CommentId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Author's username
    pub author: String,
    pub car: CarId,
}

impl From<Comment> for CommentResource {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            created_at: comment.created_at,
            author: comment.author,
            car: comment.car_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CarResource {
    pub id: CarId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owner's username
    pub owner: String,
    /// Newest first
    pub comments: Vec<CommentResource>,
}

impl CarResource {
    fn new(car: Car, comments: Vec<Comment>) -> Self {
        Self {
            id: car.id,
            make: car.make,
            model: car.model,
            year: car.year,
            description: car.description,
            created_at: car.created_at,
            updated_at: car.updated_at,
            owner: car.owner,
            comments: comments.into_iter().map(CommentResource::from).collect(),
        }
    }
}

async fn car_resource(data: &AppState, car: Car) -> Result<CarResource, ApiError> {
    let comments = service::list_comments(&*data.cars, car.id).await?;
    Ok(CarResource::new(car, comments))
}

/// Malformed JSON bodies answer 400 with a `detail` message.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = json!({ "detail": format!("JSON parse error - {err}") });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

/// `GET /api/` lists the top-level resources.
pub async fn api_root(req: HttpRequest) -> HttpResponse {
    let info = req.connection_info();
    HttpResponse::Ok().json(json!({
        "cars": format!("{}://{}/api/cars/", info.scheme(), info.host()),
    }))
}

pub async fn list_cars(req: HttpRequest, data: web::Data<AppState>) -> ApiResult {
    api_requester(&req, &data).await?;
    let cars = service::list_cars(&*data.cars).await?;
    let mut resources = Vec::with_capacity(cars.len());
    for car in cars {
        resources.push(car_resource(&data, car).await?);
    }
    Ok(HttpResponse::Ok().json(resources))
}

pub async fn create_car(req: HttpRequest, data: web::Data<AppState>, body: web::Json<CarFields>) -> ApiResult {
    let requester = api_requester(&req, &data).await?;
    let car = service::create_car(&*data.cars, &requester, &body).await?;
    log::info!("api: car {} created by {}", car.id, car.owner);
    Ok(HttpResponse::Created().json(CarResource::new(car, Vec::new())))
}

pub async fn retrieve_car(req: HttpRequest, data: web::Data<AppState>, path: web::Path<CarId>) -> ApiResult {
    api_requester(&req, &data).await?;
    let (car, comments) = service::car_with_comments(&*data.cars, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CarResource::new(car, comments)))
}

async fn write_car(req: HttpRequest, data: web::Data<AppState>, id: CarId, body: CarFields, partial: bool) -> ApiResult {
    let requester = api_requester(&req, &data).await?;
    let access = Access::from_method(req.method().as_str());
    let car = service::modify_car(&*data.cars, &requester, id, access, &body, partial).await?;
    log::info!("api: car {} updated by {}", car.id, car.owner);
    Ok(HttpResponse::Ok().json(car_resource(&data, car).await?))
}

/// `PUT`: every writable field is required.
pub async fn update_car(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<CarId>,
    body: web::Json<CarFields>,
) -> ApiResult {
    write_car(req, data, path.into_inner(), body.into_inner(), false).await
}

/// `PATCH`: absent fields keep their values.
pub async fn partial_update_car(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<CarId>,
    body: web::Json<CarFields>,
) -> ApiResult {
    write_car(req, data, path.into_inner(), body.into_inner(), true).await
}

pub async fn destroy_car(req: HttpRequest, data: web::Data<AppState>, path: web::Path<CarId>) -> ApiResult {
    let requester = api_requester(&req, &data).await?;
    let id = path.into_inner();
    let access = Access::from_method(req.method().as_str());
    service::destroy_car(&*data.cars, &requester, id, access).await?;
    log::info!("api: car {} deleted", id);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_comments(req: HttpRequest, data: web::Data<AppState>, path: web::Path<CarId>) -> ApiResult {
    api_requester(&req, &data).await?;
    let comments = service::list_comments(&*data.cars, path.into_inner()).await?;
    let resources: Vec<CommentResource> = comments.into_iter().map(CommentResource::from).collect();
    Ok(HttpResponse::Ok().json(resources))
}

pub async fn create_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<CarId>,
    body: web::Json<CommentFields>,
) -> ApiResult {
    let requester = api_requester(&req, &data).await?;
    let comment = service::create_comment(&*data.cars, &requester, path.into_inner(), &body).await?;
    log::info!("api: comment {} added to car {}", comment.id, comment.car_id);
    Ok(HttpResponse::Created().json(CommentResource::from(comment)))
}

pub async fn retrieve_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<(CarId, CommentId)>,
) -> ApiResult {
    api_requester(&req, &data).await?;
    let (car_id, id) = path.into_inner();
    let comment = service::retrieve_comment(&*data.cars, car_id, id).await?;
    Ok(HttpResponse::Ok().json(CommentResource::from(comment)))
}

async fn write_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    (car_id, id): (CarId, CommentId),
    body: CommentFields,
    partial: bool,
) -> ApiResult {
    let requester = api_requester(&req, &data).await?;
    let access = Access::from_method(req.method().as_str());
    let comment = service::modify_comment(&*data.cars, &requester, car_id, id, access, &body, partial).await?;
    Ok(HttpResponse::Ok().json(CommentResource::from(comment)))
}

pub async fn update_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<(CarId, CommentId)>,
    body: web::Json<CommentFields>,
) -> ApiResult {
    write_comment(req, data, path.into_inner(), body.into_inner(), false).await
}

pub async fn partial_update_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<(CarId, CommentId)>,
    body: web::Json<CommentFields>,
) -> ApiResult {
    write_comment(req, data, path.into_inner(), body.into_inner(), true).await
}

pub async fn destroy_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<(CarId, CommentId)>,
) -> ApiResult {
    let requester = api_requester(&req, &data).await?;
    let (car_id, id) = path.into_inner();
    let access = Access::from_method(req.method().as_str());
    service::destroy_comment(&*data.cars, &requester, car_id, id, access).await?;
    Ok(HttpResponse::NoContent().finish())
}
