use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use vidtube_db::Database;

use crate::auth::{AppState, AppStateInner, create_token};
use crate::media::MediaClient;
use crate::routes::router;

const SECRET: &str = "test-secret";

fn app() -> (Router, AppState) {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: SECRET.into(),
        token_ttl_days: 1,
        media: MediaClient::disabled(),
    });
    (router(state.clone()), state)
}

fn login_as(state: &AppState, username: &str) -> (Uuid, String) {
    let user = state
        .db
        .create_user(username, &format!("{} Full", username), None, "unused")
        .unwrap();
    let token = create_token(SECRET, 1, user.id, username).unwrap();
    (user.id, token)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn publish(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/videos",
        Some(token),
        Some(json!({
            "title": title,
            "description": "desc",
            "videoFile": { "publicId": format!("{}-file", title), "url": "https://m/v.mp4" },
            "thumbnail": { "publicId": format!("{}-thumb", title), "url": "https://m/t.jpg" },
            "duration": 30.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_requires_token() {
    let (app, _) = app();
    let (status, body) = call(&app, Method::GET, "/likes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["statusCode"], json!(401));

    let (status, _) = call(&app, Method::GET, "/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_login_current() {
    let (app, _) = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({ "username": "Carol", "fullName": "Carol C", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], json!("carol"));

    let (status, _) = call(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "username": "carol", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "username": "carol", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, "/users/current", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullName"], json!("Carol C"));
}

#[tokio::test]
async fn test_playlist_scenario() {
    let (app, state) = app();
    let (u, u_token) = login_as(&state, "u");
    let (_, w_token) = login_as(&state, "w");

    let (status, body) = call(
        &app,
        Method::POST,
        "/playlist",
        Some(&u_token),
        Some(json!({ "name": "Favorites", "description": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let p = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, &format!("/playlist/{}", p), Some(&u_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ownerId"], json!(u.to_string()));
    assert_eq!(body["data"]["videos"], json!([]));

    let v1 = publish(&app, &u_token, "v1").await;
    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/playlist/add/{}/{}", v1, p),
        Some(&u_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["videos"], json!([v1]));

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/playlist/add/{}/{}", v1, p),
        Some(&u_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Video already exists in playlist"));

    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/playlist/remove/{}/{}", v1, p),
        Some(&w_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = call(&app, Method::GET, &format!("/playlist/{}", p), Some(&w_token), None).await;
    assert_eq!(body["data"]["videos"], json!([v1]));
}

#[tokio::test]
async fn test_like_scenario() {
    let (app, state) = app();
    let (_, owner_token) = login_as(&state, "owner");
    let (_, a_token) = login_as(&state, "a");
    let v1 = publish(&app, &owner_token, "v1").await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/likes/toggle/v/{}", v1),
        Some(&a_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], json!("active"));

    let (_, body) = call(&app, Method::GET, "/likes", Some(&a_token), None).await;
    assert_eq!(body["data"]["videoLikes"][0]["id"], json!(v1));

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/likes/toggle/v/{}", v1),
        Some(&a_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], json!("inactive"));

    let (_, body) = call(&app, Method::GET, "/likes", Some(&a_token), None).await;
    assert_eq!(body["data"]["videoLikes"], json!([]));

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/likes/toggle/t/{}", Uuid::new_v4()),
        Some(&a_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscription_scenario() {
    let (app, state) = app();
    let (c, c_token) = login_as(&state, "channel");
    let (a, a_token) = login_as(&state, "a");

    let (status, body) = call(&app, Method::GET, &format!("/dashboard/stats/{}", c), Some(&c_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({ "videoCount": 0, "totalViewCount": 0, "subscriberCount": 0, "likeCount": 0 })
    );

    let (_, body) = call(
        &app,
        Method::POST,
        &format!("/subscriptions/c/{}", c),
        Some(&a_token),
        None,
    )
    .await;
    assert_eq!(body["data"]["state"], json!("active"));

    let (_, body) = call(&app, Method::GET, &format!("/subscriptions/c/{}", c), Some(&c_token), None).await;
    assert_eq!(body["data"][0]["userId"], json!(a.to_string()));
    assert_eq!(body["data"][0]["username"], json!("a"));

    let (_, body) = call(&app, Method::GET, &format!("/dashboard/stats/{}", c), Some(&c_token), None).await;
    assert_eq!(body["data"]["subscriberCount"], json!(1));
}

#[tokio::test]
async fn test_validation_errors() {
    let (app, state) = app();
    let (_, token) = login_as(&state, "u");

    let (status, body) = call(
        &app,
        Method::POST,
        "/playlist",
        Some(&token),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("name is required"));

    let (status, body) = call(&app, Method::GET, "/playlist/not-an-id", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid playlist id"));

    let (status, _) = call(&app, Method::GET, "/videos?sortBy=password", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/dashboard/stats/{}", Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tweet_owner_only() {
    let (app, state) = app();
    let (_, a_token) = login_as(&state, "a");
    let (_, b_token) = login_as(&state, "b");

    let (status, body) = call(
        &app,
        Method::POST,
        "/tweets",
        Some(&a_token),
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let t = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/tweets/{}", t),
        Some(&b_token),
        Some(json!({ "content": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::DELETE, &format!("/tweets/{}", t), Some(&b_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::DELETE, &format!("/tweets/{}", t), Some(&a_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], json!(true));
}

#[tokio::test]
async fn test_far_page_keeps_store_usable() {
    let (app, state) = app();
    let (_, token) = login_as(&state, "u");
    let video = publish(&app, &token, "clip").await;

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/comments/{}?page=4294967295&limit=100", video),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, _) = call(&app, Method::GET, "/videos?page=4294967295&limit=100", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::POST,
        "/tweets",
        Some(&token),
        Some(json!({ "content": "still writable" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_deleted_user_token_cannot_create() {
    let (app, _) = app();
    let token = create_token(SECRET, 1, Uuid::new_v4(), "ghost").unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        "/tweets",
        Some(&token),
        Some(json!({ "content": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));

    let (status, _) = call(
        &app,
        Method::POST,
        "/playlist",
        Some(&token),
        Some(json!({ "name": "Favorites" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_channel_profile_and_watch_history() {
    let (app, state) = app();
    let (c, c_token) = login_as(&state, "channel");
    let (_, a_token) = login_as(&state, "a");
    let video = publish(&app, &c_token, "clip").await;

    let (status, body) = call(&app, Method::GET, &format!("/videos/{}", video), Some(&a_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["views"], json!(1));

    let (status, body) = call(&app, Method::GET, "/users/history", Some(&a_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], json!(video));
    assert_eq!(body["data"][0]["owner"]["username"], json!("channel"));

    // Unpublishing hides the video from other viewers without counting a view.
    call(&app, Method::PATCH, &format!("/videos/toggle/publish/{}", video), Some(&c_token), None).await;
    let (status, _) = call(&app, Method::GET, &format!("/videos/{}", video), Some(&a_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = call(&app, Method::GET, "/users/history", Some(&a_token), None).await;
    assert_eq!(body["data"], json!([]));

    call(&app, Method::POST, &format!("/subscriptions/c/{}", c), Some(&a_token), None).await;
    let (status, body) = call(&app, Method::GET, "/users/c/Channel", Some(&a_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(c.to_string()));
    assert_eq!(body["data"]["subscribersCount"], json!(1));
    assert_eq!(body["data"]["channelsSubscribedToCount"], json!(0));
    assert_eq!(body["data"]["isSubscribed"], json!(true));

    let (_, body) = call(&app, Method::GET, "/users/c/channel", Some(&c_token), None).await;
    assert_eq!(body["data"]["isSubscribed"], json!(false));

    let (status, _) = call(&app, Method::GET, "/users/c/nobody", Some(&a_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_account_update_and_password_change() {
    let (app, _) = app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({ "username": "dana", "fullName": "Dana D", "password": "first password" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body) = call(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "username": "dana", "password": "first password" })),
    )
    .await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::PATCH,
        "/users/update-account",
        Some(&token),
        Some(json!({ "fullName": "Dana Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullName"], json!("Dana Renamed"));

    let (status, _) =
        call(&app, Method::PATCH, "/users/update-account", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/change-password",
        Some(&token),
        Some(json!({ "oldPassword": "not it at all", "newPassword": "second password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid old password"));

    let (status, _) = call(
        &app,
        Method::POST,
        "/users/change-password",
        Some(&token),
        Some(json!({ "oldPassword": "first password", "newPassword": "second password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "username": "dana", "password": "first password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "username": "dana", "password": "second password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
