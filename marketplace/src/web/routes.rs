// marketplace/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{
  admin_handlers, auth_handlers, cart_handlers, checkout_handlers, dashboard_handlers, event_handlers,
  order_handlers, product_handlers, review_handlers, wishlist_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called from `main.rs` and the HTTP tests to mount every route.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/signup", web::post().to(auth_handlers::signup_handler))
          .route("/signin", web::post().to(auth_handlers::signin_handler))
          .route("/signout", web::post().to(auth_handlers::signout_handler))
          .route("/me", web::get().to(auth_handlers::me_handler))
          .route("/me", web::patch().to(auth_handlers::update_me_handler)),
      )
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
          .route("/{product_id}", web::patch().to(product_handlers::update_product_handler))
          .route("/{product_id}", web::delete().to(product_handlers::archive_product_handler))
          .route("/{product_id}/reviews", web::get().to(review_handlers::list_reviews_handler))
          .route("/{product_id}/reviews", web::post().to(review_handlers::submit_review_handler))
          .route(
            "/{product_id}/reviews/eligibility",
            web::get().to(review_handlers::review_eligibility_handler),
          ),
      )
      .service(
        web::scope("/reviews")
          .route("/{review_id}", web::patch().to(review_handlers::edit_review_handler))
          .route("/{review_id}", web::delete().to(review_handlers::delete_review_handler))
          .route("/{review_id}/vote", web::post().to(review_handlers::vote_review_handler))
          .route("/{review_id}/response", web::put().to(review_handlers::respond_to_review_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::view_cart_handler))
          .route("/add", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/{product_id}", web::put().to(cart_handlers::set_quantity_handler))
          .route("/{product_id}", web::delete().to(cart_handlers::remove_from_cart_handler)),
      )
      .service(
        web::scope("/wishlist")
          .route("", web::get().to(wishlist_handlers::view_wishlist_handler))
          .route("/{product_id}", web::post().to(wishlist_handlers::add_to_wishlist_handler))
          .route("/{product_id}", web::delete().to(wishlist_handlers::remove_from_wishlist_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          // Registered before `/{order_id}` so "available" is not parsed as an id.
          .route("/available", web::get().to(order_handlers::available_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/status", web::post().to(order_handlers::change_status_handler))
          .route("/{order_id}/claim", web::post().to(order_handlers::claim_order_handler)),
      )
      .route("/dashboard", web::get().to(dashboard_handlers::dashboard_handler))
      .service(
        web::scope("/admin")
          .route("/users", web::get().to(admin_handlers::list_users_handler))
          .route("/users/{user_id}", web::patch().to(admin_handlers::update_user_handler))
          .route("/orders", web::get().to(admin_handlers::list_orders_handler))
          .route("/analytics", web::get().to(admin_handlers::analytics_handler))
          .route("/settings", web::get().to(admin_handlers::get_settings_handler))
          .route("/settings", web::put().to(admin_handlers::update_settings_handler))
          .route("/sessions", web::get().to(admin_handlers::list_sessions_handler)),
      )
      .route("/events", web::get().to(event_handlers::events_handler)),
  );
}
