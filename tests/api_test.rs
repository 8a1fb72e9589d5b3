mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{body_json, body_string, session_cookie, test_state};
use quizzery::{router, AppState};
use serde_json::json;
use tower::ServiceExt;

async fn call(app: &Router, method: Method, uri: &str, cookie: Option<&str>) -> axum::http::Response<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(req.body(Body::empty()).expect("request build should succeed"))
        .await
        .expect("router should respond")
}

/// State with user `alice`, her router and her access token.
async fn setup() -> (AppState, Router, i64, String) {
    let state = test_state().await;
    let user_id = state.db.create_user("alice", "secret", false).await.unwrap();
    let token = state.db.regenerate_token(user_id).await.unwrap();
    let app = router(state.clone());
    (state, app, user_id, token)
}

#[tokio::test]
async fn missing_or_unknown_token_is_unauthorized() {
    let (_, app, _, _) = setup().await;

    for uri in ["/api/quizzes", "/api/quizzes?token=", "/api/quizzes?token=deadbeef", "/api/nowhere"] {
        let resp = call(&app, Method::GET, uri, None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "for {uri}");
        assert!(body_json(resp).await.get("error").is_some());
    }
}

#[tokio::test]
async fn token_owner_is_the_authenticated_user() {
    let (_, app, user_id, token) = setup().await;

    let resp = call(&app, Method::GET, &format!("/api/users/tokenOwner?token={token}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "id": user_id, "isAdmin": false, "username": "alice", "photo": null })
    );
}

#[tokio::test]
async fn unknown_format_suffix_is_not_acceptable() {
    let (_, app, _, token) = setup().await;

    let resp = call(&app, Method::GET, &format!("/api/quizzes.yaml?token={token}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn unmatched_api_routes_are_json_not_found() {
    let (_, app, _, token) = setup().await;

    let resp = call(&app, Method::GET, &format!("/api/nowhere?token={token}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({ "error": "API route not found" }));
}

#[tokio::test]
async fn quizzes_render_as_xml_without_answers() {
    let (state, app, user_id, token) = setup().await;
    state.db.create_quiz(user_id, "Capital of France?", "Paris").await.unwrap();
    state.db.create_quiz(user_id, "Largest planet?", "Jupiter").await.unwrap();

    let resp = call(&app, Method::GET, &format!("/api/quizzes.xml?token={token}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/xml"));

    let body = body_string(resp).await;
    assert!(body.starts_with("<?xml version='1.0'?>"));
    assert_eq!(body.matches("<quiz>").count(), 2);
    assert!(body.contains("<question>Capital of France?</question>"));
    assert!(!body.contains("Paris"));
}

#[tokio::test]
async fn quiz_listing_pages_link_to_the_next_page() {
    let (state, app, user_id, token) = setup().await;
    for n in 1..=12 {
        state.db.create_quiz(user_id, &format!("Q{n}"), "A").await.unwrap();
    }

    let resp = call(&app, Method::GET, &format!("/api/quizzes?token={token}"), None).await;
    let first = body_json(resp).await;
    assert_eq!(first["pageno"], 1);
    assert_eq!(first["quizzes"].as_array().unwrap().len(), 10);
    assert!(first["quizzes"][0].get("answer").is_none());
    assert_eq!(
        first["nextUrl"],
        format!("http://localhost/api/quizzes?token={token}&pageno=2")
    );

    let resp = call(&app, Method::GET, &format!("/api/quizzes.json?token={token}&pageno=2"), None).await;
    let second = body_json(resp).await;
    assert_eq!(second["pageno"], 2);
    assert_eq!(second["quizzes"].as_array().unwrap().len(), 2);
    assert_eq!(second["nextUrl"], "");
}

#[tokio::test]
async fn huge_page_numbers_give_an_empty_page() {
    let (state, app, user_id, token) = setup().await;
    state.db.create_quiz(user_id, "Q", "A").await.unwrap();

    let uri = format!("/api/quizzes?token={token}&pageno={}", i64::MAX);
    let resp = call(&app, Method::GET, &uri, None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page = body_json(resp).await;
    assert_eq!(page["pageno"], i64::MAX);
    assert!(page["quizzes"].as_array().unwrap().is_empty());
    assert_eq!(page["nextUrl"], "");
}

#[tokio::test]
async fn favourite_then_list_my_favourites() {
    let (state, app, user_id, token) = setup().await;
    let mut ids = Vec::new();
    for n in 1..=5 {
        ids.push(state.db.create_quiz(user_id, &format!("Q{n}"), "A").await.unwrap());
    }
    let fifth = ids[4];

    let favourite_url = format!("/api/users/tokenOwner/favourites/{fifth}?token={token}");
    let resp = call(&app, Method::PUT, &favourite_url, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    // Idempotent.
    let resp = call(&app, Method::PUT, &favourite_url, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.db.fans_count(fifth).await.unwrap(), 1);

    let list_url = format!("/api/quizzes?token={token}&searchfavourites=true");
    let listed = body_json(call(&app, Method::GET, &list_url, None).await).await;
    let quizzes = listed["quizzes"].as_array().unwrap();
    assert_eq!(quizzes.len(), 1);
    assert_eq!(quizzes[0]["id"], fifth);
    assert_eq!(quizzes[0]["favourite"], true);

    let resp = call(&app, Method::DELETE, &favourite_url, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = body_json(call(&app, Method::GET, &list_url, None).await).await;
    assert!(listed["quizzes"].as_array().unwrap().is_empty());

    let resp = call(
        &app,
        Method::PUT,
        &format!("/api/users/tokenOwner/favourites/9999?token={token}"),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn check_reports_matching_answers() {
    let (state, app, user_id, token) = setup().await;
    let quiz_id = state.db.create_quiz(user_id, "Capital of France?", "paris").await.unwrap();

    let resp = call(
        &app,
        Method::GET,
        &format!("/api/quizzes/{quiz_id}/check?token={token}&answer=Paris%20"),
        None,
    )
    .await;
    assert_eq!(
        body_json(resp).await,
        json!({ "quizId": quiz_id, "answer": "Paris ", "result": true })
    );
}

#[tokio::test]
async fn random_quiz_or_nomore() {
    let (state, app, user_id, token) = setup().await;

    let resp = call(&app, Method::GET, &format!("/api/quizzes/random?token={token}"), None).await;
    assert_eq!(body_json(resp).await, json!({ "nomore": true }));

    let quiz_id = state.db.create_quiz(user_id, "Q", "A").await.unwrap();
    let resp = call(&app, Method::GET, &format!("/api/quizzes/random?token={token}"), None).await;
    assert_eq!(body_json(resp).await["id"], quiz_id);
}

#[tokio::test]
async fn random10wa_includes_answers() {
    let (state, app, user_id, token) = setup().await;
    for n in 1..=12 {
        state.db.create_quiz(user_id, &format!("Q{n}"), &format!("A{n}")).await.unwrap();
    }

    let resp = call(&app, Method::GET, &format!("/api/quizzes/random10wa?token={token}"), None).await;
    let quizzes = body_json(resp).await;
    let quizzes = quizzes.as_array().unwrap();
    assert_eq!(quizzes.len(), 10);
    assert!(quizzes.iter().all(|q| q["answer"].is_string()));

    let mut ids: Vec<i64> = quizzes.iter().map(|q| q["id"].as_i64().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn random_play_runs_over_the_cookie_session() {
    let (state, app, user_id, token) = setup().await;
    let first = state.db.create_quiz(user_id, "Q1", "A1").await.unwrap();
    let second = state.db.create_quiz(user_id, "Q2", "A2").await.unwrap();
    let answer_of = |id: i64| if id == first { "a1" } else { "a2" };

    let resp = call(&app, Method::GET, &format!("/api/quizzes/randomPlay/check?token={token}&answer=x"), None).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = call(&app, Method::GET, &format!("/api/quizzes/randomPlay/new?token={token}"), None).await;
    let cookie = session_cookie(&resp).expect("the run is kept in the session");
    let started = body_json(resp).await;
    assert_eq!(started["score"], 0);
    let current = started["quiz"]["id"].as_i64().unwrap();
    assert!(current == first || current == second);

    // Asking again without answering serves the same quiz.
    let next_url = format!("/api/quizzes/randomPlay/next?token={token}");
    let again = body_json(call(&app, Method::GET, &next_url, Some(&cookie)).await).await;
    assert_eq!(again["quiz"]["id"], current);

    let check_url = |answer: &str| format!("/api/quizzes/randomPlay/check?token={token}&answer={answer}");
    let checked = body_json(call(&app, Method::GET, &check_url(answer_of(current)), Some(&cookie)).await).await;
    assert_eq!(
        checked,
        json!({ "quizId": current, "answer": answer_of(current), "result": true, "score": 1 })
    );

    // Nothing awaits an answer until the next quiz is served.
    let resp = call(&app, Method::GET, &check_url(answer_of(current)), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let following = body_json(call(&app, Method::GET, &next_url, Some(&cookie)).await).await;
    let other = following["quiz"]["id"].as_i64().unwrap();
    assert_ne!(other, current);
    assert_eq!(following["score"], 1);

    let wrong = body_json(call(&app, Method::GET, &check_url("nope"), Some(&cookie)).await).await;
    assert_eq!(wrong["result"], false);
    assert_eq!(wrong["score"], 1);

    // A wrong answer ended the run, so the next one starts fresh.
    let fresh = body_json(call(&app, Method::GET, &next_url, Some(&cookie)).await).await;
    assert_eq!(fresh["score"], 0);
}

#[tokio::test]
async fn api_allows_cross_origin_requests() {
    let (_, app, _, token) = setup().await;

    let req = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/quizzes?token={token}"))
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
