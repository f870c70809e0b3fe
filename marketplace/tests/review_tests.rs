// tests/review_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use adaze_core::Role;
use adaze_marketplace::web::configure_app_routes;
use serde_json::json;

use common::{create_product, create_user, send, test_state};

#[actix_web::test]
async fn review_submission_and_rating_summary() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure_app_routes)).await;
  let trader = create_user(&state, "trader@example.com", Role::Trader).await;
  let first = create_user(&state, "first@example.com", Role::Buyer).await;
  let second = create_user(&state, "second@example.com", Role::Buyer).await;
  let yam = create_product(&state, &trader, "Yam", 4_500, 10).await;
  let reviews_uri = format!("/api/v1/products/{}/reviews", yam.id);

  let req = test::TestRequest::get()
    .uri(&format!("{}/eligibility", reviews_uri))
    .insert_header(first.auth())
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["eligible"], true);
  assert_eq!(body["verified_purchase"], false);

  let req = test::TestRequest::post()
    .uri(&reviews_uri)
    .insert_header(first.auth())
    .set_json(json!({ "rating": 5, "title": "  Lovely  ", "comment": "Firm tubers, cooked well." }))
    .to_request();
  let (status, review) = send(&app, req).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(review["rating"], 5);
  assert_eq!(review["title"], "Lovely");
  assert_eq!(review["verified_purchase"], false);

  let req = test::TestRequest::post()
    .uri(&reviews_uri)
    .insert_header(first.auth())
    .set_json(json!({ "rating": 4, "comment": "Second thoughts on these." }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let req = test::TestRequest::post()
    .uri(&reviews_uri)
    .insert_header(trader.auth())
    .set_json(json!({ "rating": 5, "comment": "Best yams in the market." }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let req = test::TestRequest::post()
    .uri(&reviews_uri)
    .insert_header(second.auth())
    .set_json(json!({ "rating": 6, "comment": "Too good to be true." }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri(&reviews_uri)
    .insert_header(second.auth())
    .set_json(json!({ "rating": 2, "comment": "Short" }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri(&reviews_uri)
    .insert_header(second.auth())
    .set_json(json!({ "rating": 2, "comment": "Two of them were soft inside." }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::CREATED);

  let req = test::TestRequest::get().uri(&format!("{}?sort=lowest", reviews_uri)).to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["summary"]["total"], 2);
  assert_eq!(body["summary"]["average"], 3.5);
  assert_eq!(body["summary"]["breakdown"], json!([0, 1, 0, 0, 1]));
  assert_eq!(body["reviews"][0]["rating"], 2);

  let req = test::TestRequest::get().uri(&format!("{}?rating=5", reviews_uri)).to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(body["reviews"].as_array().map(Vec::len), Some(1));
  assert_eq!(body["summary"]["total"], 2);

  let req = test::TestRequest::get().uri(&format!("/api/v1/products/{}", yam.id)).to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["rating"]["total"], 2);
}

#[actix_web::test]
async fn delivered_orders_mark_reviews_as_verified() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure_app_routes)).await;
  let admin = create_user(&state, "admin@example.com", Role::Admin).await;
  let trader = create_user(&state, "trader@example.com", Role::Trader).await;
  let buyer = create_user(&state, "buyer@example.com", Role::Buyer).await;
  let oil = create_product(&state, &trader, "Palm oil", 7_800, 10).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/add")
    .insert_header(buyer.auth())
    .set_json(json!({ "product_id": oil.id }))
    .to_request();
  send(&app, req).await;
  let req = test::TestRequest::post().uri("/api/v1/checkout").insert_header(buyer.auth()).to_request();
  let (_, body) = send(&app, req).await;
  let order_id = body["orders"][0]["id"].as_str().unwrap_or_default().to_string();

  for next in ["confirmed", "shipped", "delivered"] {
    let req = test::TestRequest::post()
      .uri(&format!("/api/v1/orders/{}/status", order_id))
      .insert_header(admin.auth())
      .set_json(json!({ "status": next }))
      .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "admin moves the order to {}", next);
  }

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/products/{}/reviews", oil.id))
    .insert_header(buyer.auth())
    .set_json(json!({ "rating": 4, "comment": "Rich colour, arrived sealed." }))
    .to_request();
  let (status, review) = send(&app, req).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(review["verified_purchase"], true);
}

#[actix_web::test]
async fn votes_responses_edits_and_deletes() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure_app_routes)).await;
  let trader = create_user(&state, "trader@example.com", Role::Trader).await;
  let author = create_user(&state, "author@example.com", Role::Buyer).await;
  let reader = create_user(&state, "reader@example.com", Role::Buyer).await;
  let fabric = create_product(&state, &trader, "Ankara fabric", 12_000, 3).await;

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/products/{}/reviews", fabric.id))
    .insert_header(author.auth())
    .set_json(json!({ "rating": 3, "title": "Okay", "comment": "Colours faded after one wash." }))
    .to_request();
  let (_, review) = send(&app, req).await;
  let review_uri = format!("/api/v1/reviews/{}", review["id"].as_str().unwrap_or_default());

  // Voting on your own review is not allowed.
  let req = test::TestRequest::post()
    .uri(&format!("{}/vote", review_uri))
    .insert_header(author.auth())
    .set_json(json!({ "vote": "helpful" }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let req = test::TestRequest::post()
    .uri(&format!("{}/vote", review_uri))
    .insert_header(reader.auth())
    .set_json(json!({ "vote": "helpful" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["helpful_count"], 1);

  let req = test::TestRequest::post()
    .uri(&format!("{}/vote", review_uri))
    .insert_header(reader.auth())
    .set_json(json!({ "vote": "not_helpful" }))
    .to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(body["helpful_count"], 0);
  assert_eq!(body["not_helpful_count"], 1);

  let req = test::TestRequest::post()
    .uri(&format!("{}/vote", review_uri))
    .insert_header(reader.auth())
    .set_json(json!({ "vote": null }))
    .to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(body["helpful_count"], 0);
  assert_eq!(body["not_helpful_count"], 0);

  let req = test::TestRequest::put()
    .uri(&format!("{}/response", review_uri))
    .insert_header(reader.auth())
    .set_json(json!({ "body": "Not my product." }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let req = test::TestRequest::put()
    .uri(&format!("{}/response", review_uri))
    .insert_header(trader.auth())
    .set_json(json!({ "body": "Please wash in cold water." }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["response"]["state"], "responded");
  assert_eq!(body["review"]["trader_response"], "Please wash in cold water.");

  let req = test::TestRequest::patch()
    .uri(&review_uri)
    .insert_header(reader.auth())
    .set_json(json!({ "rating": 1 }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let req = test::TestRequest::patch()
    .uri(&review_uri)
    .insert_header(author.auth())
    .set_json(json!({ "rating": 4, "title": "" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["rating"], 4);
  assert!(body["title"].is_null());
  assert_eq!(body["comment"], "Colours faded after one wash.");

  let req = test::TestRequest::delete().uri(&review_uri).insert_header(reader.auth()).to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let req = test::TestRequest::delete().uri(&review_uri).insert_header(author.auth()).to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/products/{}/reviews", fabric.id))
    .to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(body["summary"]["total"], 0);
}
