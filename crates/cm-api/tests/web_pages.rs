//! HTML site flows driven through the full router.

#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::PASSWORD;

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn body_text<B: actix_web::body::MessageBody>(resp: actix_web::dev::ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

#[actix_web::test]
async fn test_anonymous_visitor_sees_car_list() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    env.car(&alice, "Toyota").await;
    let app = app!(env);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("2020 Toyota Model"));
    assert!(body.contains("added by alice"));
}

#[actix_web::test]
async fn test_create_assigns_requester_as_owner() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    let cookie = env.login(&alice).await;
    let app = app!(env);

    let owner_id = bob.id.to_string();
    let req = test::TestRequest::post()
        .uri("/car/new/")
        .cookie(cookie)
        .set_form([
            ("make", "Toyota"),
            ("model", "Camry"),
            ("year", "2020"),
            ("description", "Blue"),
            ("owner", owner_id.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let cars = env.cars().await;
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0].owner_id, alice.id);
    assert_eq!(cars[0].year, 2020);
}

#[actix_web::test]
async fn test_anonymous_create_redirects_to_login() {
    let env = common::env().await;
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/car/new/")
        .set_form([("make", "Toyota"), ("model", "Camry"), ("year", "2020"), ("description", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login/?next=/car/new/");
    assert!(env.cars().await.is_empty());
}

#[actix_web::test]
async fn test_invalid_year_rerenders_form_with_errors() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    let cookie = env.login(&alice).await;
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/car/new/")
        .cookie(cookie)
        .set_form([("make", "Toyota"), ("model", "Camry"), ("year", "soon"), ("description", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("A valid integer is required."));
    assert!(body.contains("value=\"soon\""));
    assert!(env.cars().await.is_empty());
}

#[actix_web::test]
async fn test_stranger_cannot_edit_or_delete() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    let car = env.car(&bob, "Honda").await;
    let cookie = env.login(&alice).await;
    let app = app!(env);

    let edit = test::TestRequest::get()
        .uri(&format!("/car/{}/edit/", car.id))
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, edit).await.status(), StatusCode::NOT_FOUND);

    let delete = test::TestRequest::post()
        .uri(&format!("/car/{}/delete/", car.id))
        .cookie(cookie)
        .to_request();
    assert_eq!(test::call_service(&app, delete).await.status(), StatusCode::NOT_FOUND);

    assert_eq!(env.cars().await.len(), 1);
}

#[actix_web::test]
async fn test_owner_updates_car() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    let car = env.car(&alice, "Toyota").await;
    let cookie = env.login(&alice).await;
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri(&format!("/car/{}/edit/", car.id))
        .cookie(cookie)
        .set_form([("make", "Toyota"), ("model", "Corolla"), ("year", "2021"), ("description", "New")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let cars = env.cars().await;
    assert_eq!(cars[0].model, "Corolla");
    assert_eq!(cars[0].year, 2021);
    assert!(cars[0].updated_at >= car.updated_at);
}

#[actix_web::test]
async fn test_owner_delete_removes_comments() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    let car = env.car(&alice, "Toyota").await;
    env.comment(&bob, car.id, "Nice").await;
    let cookie = env.login(&alice).await;
    let app = app!(env);

    let confirm = test::TestRequest::get()
        .uri(&format!("/car/{}/delete/", car.id))
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, confirm).await.status(), StatusCode::OK);

    let delete = test::TestRequest::post()
        .uri(&format!("/car/{}/delete/", car.id))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, delete).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    assert!(env.cars().await.is_empty());
    assert!(env.comments(car.id).await.is_empty());
}

#[actix_web::test]
async fn test_anonymous_comment_is_dropped() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    let car = env.car(&alice, "Toyota").await;
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri(&format!("/car/{}/", car.id))
        .set_form([("content", "hello")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/car/{}/", car.id));
    assert!(env.comments(car.id).await.is_empty());
}

#[actix_web::test]
async fn test_anonymous_comment_without_form_body_redirects() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    let car = env.car(&alice, "Toyota").await;
    let app = app!(env);

    let bare = test::TestRequest::post().uri(&format!("/car/{}/", car.id)).to_request();
    let resp = test::call_service(&app, bare).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/car/{}/", car.id));

    let multipart = test::TestRequest::post()
        .uri(&format!("/car/{}/", car.id))
        .insert_header((header::CONTENT_TYPE, "multipart/form-data; boundary=XyZ"))
        .set_payload("--XyZ\r\nContent-Disposition: form-data; name=\"content\"\r\n\r\nhello\r\n--XyZ--\r\n")
        .to_request();
    let resp = test::call_service(&app, multipart).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/car/{}/", car.id));

    assert!(env.comments(car.id).await.is_empty());
}

#[actix_web::test]
async fn test_comment_route_alias_creates_comment() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    let car = env.car(&alice, "Toyota").await;
    let cookie = env.login(&bob).await;
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri(&format!("/car/{}/comment/", car.id))
        .cookie(cookie)
        .set_form([("content", "via the comment route")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/car/{}/", car.id));

    let comments = env.comments(car.id).await;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content, "via the comment route");
    assert_eq!(comments[0].author_id, bob.id);
}

#[actix_web::test]
async fn test_comments_render_newest_first() {
    let env = common::env().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    let car = env.car(&alice, "Toyota").await;
    let cookie = env.login(&bob).await;
    let app = app!(env);

    for content in ["first remark", "second remark"] {
        let req = test::TestRequest::post()
            .uri(&format!("/car/{}/", car.id))
            .cookie(cookie.clone())
            .set_form([("content", content)])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SEE_OTHER);
    }

    let resp = test::call_service(&app, test::TestRequest::get().uri(&format!("/car/{}/", car.id)).to_request()).await;
    let body = body_text(resp).await;
    let first = body.find("first remark").unwrap();
    let second = body.find("second remark").unwrap();
    assert!(second < first);
}

#[actix_web::test]
async fn test_unknown_car_is_not_found() {
    let env = common::env().await;
    let app = app!(env);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/car/999/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/car/999/")
        .set_form([("content", "hello")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_register_logs_the_new_user_in() {
    let env = common::env().await;
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/register/")
        .set_form([
            ("username", "carol"),
            ("email", "carol@example.com"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "sessionid")
        .unwrap()
        .into_owned();

    let form = test::TestRequest::get().uri("/car/new/").cookie(cookie).to_request();
    assert_eq!(test::call_service(&app, form).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_duplicate_username_is_rejected() {
    let env = common::env().await;
    env.user("alice").await;
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/register/")
        .set_form([
            ("username", "alice"),
            ("email", "other@example.com"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("A user with that username already exists."));
}

#[actix_web::test]
async fn test_login_then_logout() {
    let env = common::env().await;
    env.user("alice").await;
    let app = app!(env);

    let wrong = test::TestRequest::post()
        .uri("/login/")
        .set_form([("username", "alice"), ("password", "nope-nope"), ("next", "/car/new/")])
        .to_request();
    let resp = test::call_service(&app, wrong).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Please enter a correct username and password."));

    let right = test::TestRequest::post()
        .uri("/login/")
        .set_form([("username", "alice"), ("password", PASSWORD), ("next", "/car/new/")])
        .to_request();
    let resp = test::call_service(&app, right).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/car/new/");
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "sessionid")
        .unwrap()
        .into_owned();

    let logout = test::TestRequest::post().uri("/logout/").cookie(cookie.clone()).to_request();
    assert_eq!(test::call_service(&app, logout).await.status(), StatusCode::SEE_OTHER);

    // The old token no longer identifies anyone.
    let form = test::TestRequest::get().uri("/car/new/").cookie(cookie).to_request();
    let resp = test::call_service(&app, form).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login/?next=/car/new/");
}
