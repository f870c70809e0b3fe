// tests/auth_tests.rs

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use adaze_core::Role;
use adaze_marketplace::web::configure_app_routes;
use serde_json::json;

use common::{create_user, send, test_state, PASSWORD};

#[actix_web::test]
async fn signup_signin_me_signout_round() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure_app_routes)).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signup")
    .set_json(json!({
      "email": "  Amaka@Example.com ",
      "password": PASSWORD,
      "full_name": "Amaka Obi",
      "role": "trader"
    }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["user"]["email"], "amaka@example.com");
  assert_eq!(body["user"]["role"], "trader");
  assert!(body["user"].get("password_hash").is_none());

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signin")
    .insert_header((header::USER_AGENT, "auth-tests"))
    .set_json(json!({ "email": "amaka@example.com", "password": PASSWORD }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  let token = body["token"].as_str().expect("token is returned").to_string();
  assert_eq!(token.len(), 64);

  let bearer = (header::AUTHORIZATION, format!("Bearer {}", token));
  let req = test::TestRequest::get().uri("/api/v1/auth/me").insert_header(bearer.clone()).to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["full_name"], "Amaka Obi");

  let req = test::TestRequest::patch()
    .uri("/api/v1/auth/me")
    .insert_header(bearer.clone())
    .set_json(json!({ "phone": "+2348000000000" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["phone"], "+2348000000000");

  let req = test::TestRequest::post().uri("/api/v1/auth/signout").insert_header(bearer.clone()).to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let req = test::TestRequest::get().uri("/api/v1/auth/me").insert_header(bearer).to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn signup_rejects_duplicates_and_admin_role() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure_app_routes)).await;
  create_user(&state, "taken@example.com", Role::Buyer).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signup")
    .set_json(json!({ "email": "TAKEN@example.com", "password": PASSWORD, "full_name": "Copy" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].is_string());

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signup")
    .set_json(json!({ "email": "boss@example.com", "password": PASSWORD, "full_name": "Boss", "role": "admin" }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signup")
    .set_json(json!({ "email": "short@example.com", "password": "abc", "full_name": "Short" }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn signin_rejects_bad_credentials_and_suspended_accounts() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure_app_routes)).await;
  let admin = create_user(&state, "admin@example.com", Role::Admin).await;
  let buyer = create_user(&state, "buyer@example.com", Role::Buyer).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signin")
    .set_json(json!({ "email": "buyer@example.com", "password": "not-the-password" }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signin")
    .set_json(json!({ "email": "nobody@example.com", "password": PASSWORD }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::patch()
    .uri(&format!("/api/v1/admin/users/{}", buyer.id))
    .insert_header(admin.auth())
    .set_json(json!({ "suspended": true }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["suspended"], true);

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signin")
    .set_json(json!({ "email": "buyer@example.com", "password": PASSWORD }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  // Existing sessions stop working too.
  let req = test::TestRequest::get().uri("/api/v1/auth/me").insert_header(buyer.auth()).to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let req = test::TestRequest::patch()
    .uri(&format!("/api/v1/admin/users/{}", buyer.id))
    .insert_header(admin.auth())
    .set_json(json!({ "suspended": false }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);

  let req = test::TestRequest::get().uri("/api/v1/auth/me").insert_header(buyer.auth()).to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn closed_registrations_block_signup() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure_app_routes)).await;

  let mut settings = state.store.settings().await.expect("settings load");
  settings.allow_registrations = false;
  state.store.save_settings(&settings).await.expect("settings save");

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signup")
    .set_json(json!({ "email": "late@example.com", "password": PASSWORD, "full_name": "Late" }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn protected_routes_need_a_bearer_token() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure_app_routes)).await;

  let req = test::TestRequest::get().uri("/api/v1/cart").to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::get()
    .uri("/api/v1/cart")
    .insert_header((header::AUTHORIZATION, "Bearer not-a-real-token"))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::get().uri("/api/v1/health").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}
