use cookie::{Cookie, time::OffsetDateTime};
use reqwest::header::SET_COOKIE;

use crate::helpers::{
    SESSION_NAME, spawn_app, spawn_app_with, spawn_app_with_undeletable_sessions,
};

fn removal_cookie(response: &reqwest::Response) -> Cookie<'static> {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("Missing Set-Cookie header")
        .to_str()
        .expect("Set-Cookie is not ascii")
        .to_string();
    Cookie::parse(header).expect("Invalid Set-Cookie header")
}

#[tokio::test]
async fn logout_with_active_session_returns_200_and_destroys_it() {
    let app = spawn_app().await;
    let session_id = app
        .seed_session(serde_json::json!({ "user": "alice" }))
        .await;

    let before = OffsetDateTime::now_utc();
    let response = app.logout(Some(app.session_cookie(session_id))).await;

    assert_eq!(200, response.status().as_u16());
    let cookie = removal_cookie(&response);
    assert_eq!(cookie.name(), SESSION_NAME);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.domain(), Some("example.com"));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.http_only(), Some(true));
    assert!(cookie.expires_datetime().expect("No expiry") < before);

    let body: serde_json::Value = response.json().await.expect("Body is not json");
    assert_eq!(body, serde_json::json!({ "message": "Logout successful" }));

    assert!(!app.session_exists(session_id).await);
}

#[tokio::test]
async fn logout_twice_returns_the_same_response() {
    let app = spawn_app().await;
    let session_id = app
        .seed_session(serde_json::json!({ "user": "alice" }))
        .await;
    let cookie = app.session_cookie(session_id);

    let first = app.logout(Some(cookie.clone())).await;
    assert_eq!(200, first.status().as_u16());
    let first_body = first.text().await.expect("Failed to read body");

    let second = app.logout(Some(cookie)).await;
    assert_eq!(200, second.status().as_u16());
    assert!(second.headers().get(SET_COOKIE).is_some());
    let second_body = second.text().await.expect("Failed to read body");

    assert_eq!(first_body, second_body);
    assert!(!app.session_exists(session_id).await);
}

#[tokio::test]
async fn logout_without_session_returns_200() {
    let app = spawn_app().await;

    let response = app.logout(None).await;

    assert_eq!(200, response.status().as_u16());
    assert!(response.headers().get(SET_COOKIE).is_some());
    let body: serde_json::Value = response.json().await.expect("Body is not json");
    assert_eq!(body, serde_json::json!({ "message": "Logout successful" }));
}

#[tokio::test]
async fn logout_accepts_get_requests() {
    let app = spawn_app().await;
    let session_id = app
        .seed_session(serde_json::json!({ "user": "alice" }))
        .await;

    let response = app
        .client
        .get(format!("{}/logout", app.address))
        .header(reqwest::header::COOKIE, app.session_cookie(session_id))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    assert!(!app.session_exists(session_id).await);
}

#[tokio::test]
async fn logout_with_forged_cookie_leaves_the_record_alone() {
    let app = spawn_app().await;
    let session_id = app
        .seed_session(serde_json::json!({ "user": "alice" }))
        .await;

    let response = app
        .logout(Some(format!("{SESSION_NAME}={session_id}")))
        .await;

    assert_eq!(200, response.status().as_u16());
    assert!(app.session_exists(session_id).await);
}

#[tokio::test]
async fn logout_without_cookie_transport_sends_no_cookie_and_destroys_the_record() {
    let app = spawn_app_with(|config| {
        config.session_settings.session_use_cookies = false;
    })
    .await;
    let session_id = app
        .seed_session(serde_json::json!({ "user": "alice" }))
        .await;

    let response = app
        .client
        .post(format!("{}/logout?{SESSION_NAME}={session_id}", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert!(!app.session_exists(session_id).await);
}

#[tokio::test]
async fn clearing_cookie_uses_the_configured_scope() {
    let app = spawn_app_with(|config| {
        config.session_settings.session_cookie_path = "/app".to_string();
        config.session_settings.session_cookie_domain = None;
        config.session_settings.session_cookie_secure = Some(false);
        config.session_settings.session_cookie_http_only = false;
    })
    .await;

    let response = app.logout(None).await;

    let cookie = removal_cookie(&response);
    assert_eq!(cookie.path(), Some("/app"));
    assert_eq!(cookie.domain(), None);
    assert_ne!(cookie.secure(), Some(true));
    assert_ne!(cookie.http_only(), Some(true));
}

#[tokio::test]
async fn logout_with_failing_store_returns_500_and_still_expires_the_cookie() {
    let app = spawn_app_with_undeletable_sessions().await;
    let session_id = app
        .seed_session(serde_json::json!({ "user": "alice" }))
        .await;

    let before = OffsetDateTime::now_utc();
    let response = app.logout(Some(app.session_cookie(session_id))).await;

    assert_eq!(500, response.status().as_u16());
    let cookie = removal_cookie(&response);
    assert_eq!(cookie.name(), SESSION_NAME);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.domain(), Some("example.com"));
    assert!(cookie.expires_datetime().expect("No expiry") < before);

    let body: serde_json::Value = response.json().await.expect("Body is not json");
    assert_eq!(
        body,
        serde_json::json!({ "error": "An internal server error occurred" })
    );
}
