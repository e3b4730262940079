use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{
    comments, dashboard, healthcheck, likes, playlists, subscriptions, tweets, users, videos,
};

/// All API routes. Everything except registration, login and the healthcheck
/// requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/healthcheck", get(healthcheck::healthcheck))
        .route("/users/register", post(auth::register))
        .route("/users/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users/current", get(auth::current_user))
        .route("/users/update-account", patch(users::update_account))
        .route("/users/change-password", post(users::change_password))
        .route("/users/c/{username}", get(users::channel_profile))
        .route("/users/history", get(users::watch_history))
        // Videos
        .route("/videos", get(videos::list_videos).post(videos::publish_video))
        .route(
            "/videos/{video_id}",
            get(videos::get_video)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route("/videos/toggle/publish/{video_id}", patch(videos::toggle_publish))
        // Playlists
        .route("/playlist", post(playlists::create_playlist))
        .route(
            "/playlist/{playlist_id}",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route("/playlist/user/{user_id}", get(playlists::user_playlists))
        .route("/playlist/add/{video_id}/{playlist_id}", patch(playlists::add_video))
        .route("/playlist/remove/{video_id}/{playlist_id}", patch(playlists::remove_video))
        // Tweets
        .route("/tweets", post(tweets::create_tweet))
        .route("/tweets/user/{user_id}", get(tweets::user_tweets))
        .route(
            "/tweets/{tweet_id}",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        )
        // Comments
        .route(
            "/comments/{video_id}",
            get(comments::video_comments).post(comments::add_comment),
        )
        .route(
            "/comments/c/{comment_id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        // Likes
        .route("/likes", get(likes::like_breakdown))
        .route("/likes/videos", get(likes::liked_videos))
        .route("/likes/toggle/v/{video_id}", post(likes::toggle_video_like))
        .route("/likes/toggle/c/{comment_id}", post(likes::toggle_comment_like))
        .route("/likes/toggle/t/{tweet_id}", post(likes::toggle_tweet_like))
        // Subscriptions
        .route(
            "/subscriptions/c/{channel_id}",
            get(subscriptions::channel_subscribers).post(subscriptions::toggle_subscription),
        )
        .route("/subscriptions/u/{subscriber_id}", get(subscriptions::subscribed_channels))
        // Dashboard
        .route("/dashboard/stats/{channel_id}", get(dashboard::channel_stats))
        .route("/dashboard/videos/{channel_id}", get(dashboard::channel_videos))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
}
