// tests/registration_api_tests.rs
mod common;

use actix_web::http::StatusCode;
use common::*;
use keyshop::services::auth_service;
use keyshop::store::CheckoutStore;
use serde_json::{json, Value};

fn register_body(email: &str) -> Value {
  json!({
    "name": "Asha Rao",
    "email": email,
    "username": "asha",
    "password": "correct horse battery",
    "country": "IN",
    "postcode": "560001",
  })
}

#[actix_web::test]
async fn registration_creates_user_without_exposing_hash() {
  let shop = shop_with_status("succeeded");
  let (status, body) = post_json(&shop.state, "/api/users/register", register_body("asha@example.com")).await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["email"], "asha@example.com");
  assert_eq!(body["username"], "asha");
  assert!(body.get("passwordHash").is_none());
  assert!(!body.to_string().contains("correct horse"));

  let user = shop.store.find_user_by_email("asha@example.com").await.unwrap().unwrap();
  assert!(auth_service::verify_password(user.password_hash.as_deref().unwrap(), "correct horse battery").unwrap());

  let (status, fetched) = get_json(&shop.state, &format!("/api/users/{}", user.id)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["id"], user.id.to_string());
}

#[actix_web::test]
async fn duplicate_email_is_a_conflict() {
  let shop = shop_with_status("succeeded");
  post_json(&shop.state, "/api/users/register", register_body("asha@example.com")).await;
  let mut again = register_body("ASHA@example.com");
  again["username"] = json!("asha2");
  let (status, body) = post_json(&shop.state, "/api/users/register", again).await;

  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["success"], false);
  assert_eq!(shop.store.user_count(), 1);
}

#[actix_web::test]
async fn buyer_created_at_checkout_cannot_register_again() {
  let shop = shop_with_status("succeeded");
  post_json(&shop.state, "/api/payments/buy", buy_body("asha@example.com", "123456")).await;
  let (status, _) = post_json(&shop.state, "/api/users/register", register_body("asha@example.com")).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn registration_validates_input() {
  let shop = shop_with_status("succeeded");
  let mut short_password = register_body("a@example.com");
  short_password["password"] = json!("short");
  let mut bad_postcode = register_body("b@example.com");
  bad_postcode["postcode"] = json!("12345");
  let mut no_name = register_body("c@example.com");
  no_name["name"] = json!(" ");

  for body in [short_password, bad_postcode, no_name] {
    let (status, response) = post_json(&shop.state, "/api/users/register", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], false);
  }
  assert_eq!(shop.store.user_count(), 0);
}

#[actix_web::test]
async fn unknown_user_is_not_found() {
  let shop = shop_with_status("succeeded");
  let uri = format!("/api/users/{}/payments", uuid::Uuid::new_v4());
  let (status, body) = get_json(&shop.state, &uri).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["success"], false);
}
