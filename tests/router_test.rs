mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{age_attachments, body_string, session_cookie, test_state};
use quizzery::{
    db::AttachmentModel,
    router,
    services::attachments::{AttachmentChange, ChangeOutcome, Owner, Upload},
    AppState,
};
use tower::ServiceExt;

const BOUNDARY: &str = "quizzery-test-boundary";

async fn send(app: &Router, req: Request<Body>) -> axum::http::Response<Body> {
    app.clone().oneshot(req).await.expect("router should respond")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::empty()).expect("request build should succeed")
}

fn post(uri: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    let mut req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::from(form.to_string()))
        .expect("request build should succeed")
}

fn multipart(uri: &str, cookie: &str, fields: &[(&str, &str)]) -> Request<Body> {
    multipart_with_file(uri, cookie, fields, None)
}

/// `file` is `(field, filename, content)`.
fn multipart_with_file(
    uri: &str,
    cookie: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str)>,
) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some((name, filename, content)) = file {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request build should succeed")
}

fn location(resp: &axum::http::Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let resp = send(
        app,
        post("/login", None, &format!("username={username}&password={password}")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/goback");
    session_cookie(&resp).expect("login sets a session cookie")
}

async fn quiz_attachment(state: &AppState, quiz_id: i64) -> Option<AttachmentModel> {
    state.db.get_quiz(quiz_id, None).await.unwrap().unwrap().attachment
}

async fn app_with_user() -> (AppState, Router, i64) {
    let state = test_state().await;
    let user_id = state.db.create_user("alice", "secret", false).await.unwrap();
    let app = router(state.clone());
    (state, app, user_id)
}

#[tokio::test]
async fn pages_requiring_login_answer_unauthorized() {
    let (_, app, user_id) = app_with_user().await;

    for uri in [
        "/users".to_string(),
        format!("/users/{user_id}"),
        format!("/users/{user_id}/quizzes"),
        "/quizzes/new".to_string(),
    ] {
        let resp = send(&app, get(&uri, None)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "for {uri}");
    }

    let resp = send(&app, post(&format!("/users/{user_id}/favourites/1?_method=PUT"), None, "")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_pages_render() {
    let (_, app, _) = app_with_user().await;

    for uri in ["/", "/author", "/quizzes", "/login", "/static/index.css"] {
        let resp = send(&app, get(uri, None)).await;
        assert_eq!(resp.status(), StatusCode::OK, "for {uri}");
    }

    let resp = send(&app, get("/no/such/page", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_then_logout_with_method_override() {
    let (_, app, _) = app_with_user().await;
    let cookie = login(&app, "alice", "secret").await;

    let resp = send(&app, get("/users", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("alice"));

    let resp = send(&app, post("/login?_method=DELETE", Some(&cookie), "")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = send(&app, get("/users", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn failed_login_rerenders_the_form_with_a_flash() {
    let (_, app, _) = app_with_user().await;

    let resp = send(&app, post("/login", None, "username=alice&password=nope")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Authentication has failed. Retry it again."));
}

#[tokio::test]
async fn go_back_returns_to_the_last_listing() {
    let (_, app, _) = app_with_user().await;

    let resp = send(&app, get("/goback", None)).await;
    assert_eq!(location(&resp), "/");

    let resp = send(&app, get("/quizzes?search=capital", None)).await;
    let cookie = session_cookie(&resp).expect("listing saves the back url");

    let resp = send(&app, get("/goback", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/quizzes?search=capital");
}

#[tokio::test]
async fn unknown_oauth_provider_is_not_found() {
    let (_, app, _) = app_with_user().await;

    for uri in ["/auth/github", "/auth/myspace", "/auth/google/callback?code=x&state=y"] {
        let resp = send(&app, get(uri, None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "for {uri}");
    }
}

#[tokio::test]
async fn quiz_form_validation_and_creation() {
    let (state, app, user_id) = app_with_user().await;
    let cookie = login(&app, "alice", "secret").await;

    let resp = send(
        &app,
        multipart("/quizzes", &cookie, &[("question", "Capital of France?"), ("answer", " ")]),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Answer must not be empty."));
    assert!(state.db.quiz_ids().await.unwrap().is_empty());

    let resp = send(
        &app,
        multipart("/quizzes", &cookie, &[("question", "Capital of France?"), ("answer", "Paris")]),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let ids = state.db.quiz_ids().await.unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(location(&resp), format!("/quizzes/{}", ids[0]));

    let quiz = state.db.get_quiz(ids[0], None).await.unwrap().unwrap();
    assert_eq!(quiz.author_id(), Some(user_id));
}

#[tokio::test]
async fn daily_quiz_limit_redirects_with_a_flash() {
    let (state, app, user_id) = app_with_user().await;
    for n in 0..quizzery::names::QUIZZES_PER_DAY {
        state.db.create_quiz(user_id, &format!("Q{n}"), "A").await.unwrap();
    }
    let cookie = login(&app, "alice", "secret").await;

    let resp = send(
        &app,
        multipart("/quizzes", &cookie, &[("question", "One more?"), ("answer", "No")]),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/quizzes");
    assert_eq!(
        state.db.quiz_ids().await.unwrap().len() as i64,
        quizzery::names::QUIZZES_PER_DAY
    );

    let resp = send(&app, get("/quizzes", Some(&cookie))).await;
    assert!(body_string(resp)
        .await
        .contains("You can not create more than 50 quizzes per day."));
}

#[tokio::test]
async fn editing_a_quiz_keeps_replaces_or_removes_its_attachment() {
    let (state, app, user_id) = app_with_user().await;
    let cookie = login(&app, "alice", "secret").await;
    let quiz_id = state.db.create_quiz(user_id, "Q", "A").await.unwrap();
    let update_url = format!("/quizzes/{quiz_id}?_method=PUT");
    let fields = [("question", "Q"), ("answer", "A")];

    // First upload: there is nothing to wait for.
    let resp = send(
        &app,
        multipart_with_file(&update_url, &cookie, &fields, Some(("image", "cat.png", "first"))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let first = quiz_attachment(&state, quiz_id).await.expect("first attachment");

    // Within the cool-down a new file is refused and the old one stays.
    let resp = send(
        &app,
        multipart_with_file(&update_url, &cookie, &fields, Some(("image", "dog.png", "second"))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(quiz_attachment(&state, quiz_id).await.map(|a| a.id), Some(first.id));
    let resp = send(&app, get(&format!("/quizzes/{quiz_id}"), Some(&cookie))).await;
    assert!(body_string(resp)
        .await
        .contains("Attachment file can not be modified until 1 minute has passed."));

    age_attachments(&state).await;

    // Keeping it leaves the attachment alone.
    let keep = [("question", "Q"), ("answer", "A"), ("keep_image", "on")];
    let resp = send(&app, multipart(&update_url, &cookie, &keep)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(quiz_attachment(&state, quiz_id).await.map(|a| a.id), Some(first.id));

    // Replacing it swaps files.
    let resp = send(
        &app,
        multipart_with_file(&update_url, &cookie, &fields, Some(("image", "dog.png", "second"))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let second = quiz_attachment(&state, quiz_id).await.expect("second attachment");
    assert_ne!(second.id, first.id);
    assert!(state.db.get_attachment(first.id).await.unwrap().is_none());
    assert!(!state.config.uploads_dir.join(&first.resource).exists());
    assert!(state.config.uploads_dir.join(&second.resource).exists());

    age_attachments(&state).await;

    // No file and no keep box removes it.
    let resp = send(&app, multipart(&update_url, &cookie, &fields)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(quiz_attachment(&state, quiz_id).await.is_none());
    assert!(state.db.get_attachment(second.id).await.unwrap().is_none());
    assert!(!state.config.uploads_dir.join(&second.resource).exists());
}

#[tokio::test]
async fn only_authors_and_admins_manage_quizzes() {
    let (state, app, _) = app_with_user().await;
    let bob = state.db.create_user("bob", "pw", false).await.unwrap();
    let quiz_id = state.db.create_quiz(bob, "Q", "A").await.unwrap();
    let cookie = login(&app, "alice", "secret").await;

    let resp = send(&app, get(&format!("/quizzes/{quiz_id}"), Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&app, post(&format!("/quizzes/{quiz_id}?_method=DELETE"), Some(&cookie), "")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(state.db.get_quiz(quiz_id, None).await.unwrap().is_some());

    state.db.ensure_admin("root").await.unwrap();
    let admin = login(&app, "admin", "root").await;
    let resp = send(&app, get(&format!("/quizzes/{quiz_id}"), Some(&admin))).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn play_and_check_a_quiz() {
    let (state, app, user_id) = app_with_user().await;
    let quiz_id = state.db.create_quiz(user_id, "Capital of France?", "Paris").await.unwrap();

    let resp = send(&app, get(&format!("/quizzes/{quiz_id}/play?answer=Lyon"), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Lyon"));

    let resp = send(&app, get(&format!("/quizzes/{quiz_id}/check?answer=%20paris%20"), None)).await;
    assert!(body_string(resp).await.contains("is right!"));

    let resp = send(&app, get(&format!("/quizzes/{quiz_id}/check?answer=Lyon"), None)).await;
    assert!(body_string(resp).await.contains("is wrong."));
}

#[tokio::test]
async fn favourites_are_self_service() {
    let (state, app, alice) = app_with_user().await;
    let bob = state.db.create_user("bob", "pw", false).await.unwrap();
    let quiz_id = state.db.create_quiz(bob, "Q", "A").await.unwrap();
    let cookie = login(&app, "alice", "secret").await;

    let xhr = |uri: String| {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, &cookie)
            .header("X-Requested-With", "XMLHttpRequest")
            .body(Body::empty())
            .expect("request build should succeed")
    };

    let resp = send(&app, xhr(format!("/users/{alice}/favourites/{quiz_id}?_method=PUT"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(state.db.is_fan(quiz_id, alice).await.unwrap());

    let resp = send(&app, xhr(format!("/users/{bob}/favourites/{quiz_id}?_method=PUT"))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&app, xhr(format!("/users/{alice}/favourites/9999?_method=PUT"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // A plain form post goes back instead.
    let resp = send(
        &app,
        post(&format!("/users/{alice}/favourites/{quiz_id}?_method=DELETE"), Some(&cookie), ""),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/goback");
    assert!(!state.db.is_fan(quiz_id, alice).await.unwrap());
}

#[tokio::test]
async fn random_check_without_a_run_conflicts() {
    let (state, app, user_id) = app_with_user().await;
    let quiz_id = state.db.create_quiz(user_id, "Q", "A").await.unwrap();

    let resp = send(&app, get(&format!("/quizzes/randomcheck/{quiz_id}?answer=A"), None)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(&app, get("/quizzes/randomplay", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp).expect("random play is kept in the session");

    let resp = send(&app, get("/quizzes/randomcheck/9999?answer=A", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(&app, get(&format!("/quizzes/randomcheck/{quiz_id}?answer=a"), Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("is right!"));

    let resp = send(&app, get("/quizzes/randomplay", Some(&cookie))).await;
    assert!(body_string(resp).await.contains("You answered every quiz."));
}

#[tokio::test]
async fn deleting_a_quiz_removes_its_attachment() {
    let (state, app, user_id) = app_with_user().await;
    let quiz_id = state.db.create_quiz(user_id, "Q", "A").await.unwrap();

    let upload = Upload {
        filename: "cat.png".to_string(),
        mime: "image/png".to_string(),
        bytes: b"not really a png".to_vec(),
    };
    let attachment = state
        .attachments()
        .attach(Owner::Quiz(quiz_id), &upload)
        .await
        .unwrap();
    let stored_file = state.config.uploads_dir.join(&attachment.resource);
    assert!(stored_file.exists());

    let cookie = login(&app, "alice", "secret").await;
    let resp = send(&app, post(&format!("/quizzes/{quiz_id}?_method=DELETE"), Some(&cookie), "")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/goback");

    assert!(state.db.get_quiz(quiz_id, None).await.unwrap().is_none());
    assert!(state.db.get_attachment(attachment.id).await.unwrap().is_none());
    assert!(!stored_file.exists());
}

#[tokio::test]
async fn identical_uploads_get_their_own_files() {
    let (state, _, user_id) = app_with_user().await;
    let first_quiz = state.db.create_quiz(user_id, "Q1", "A").await.unwrap();
    let second_quiz = state.db.create_quiz(user_id, "Q2", "A").await.unwrap();
    let upload = Upload {
        filename: "cat.png".to_string(),
        mime: "image/png".to_string(),
        bytes: b"same bytes".to_vec(),
    };

    let first = state.attachments().attach(Owner::Quiz(first_quiz), &upload).await.unwrap();
    let second = state.attachments().attach(Owner::Quiz(second_quiz), &upload).await.unwrap();
    assert_ne!(first.resource, second.resource);

    state
        .attachments()
        .delete_owner(Owner::Quiz(first_quiz), Some(&first))
        .await
        .unwrap();
    assert!(!state.config.uploads_dir.join(&first.resource).exists());
    assert!(state.config.uploads_dir.join(&second.resource).exists());

    // Re-uploading the same bytes must not delete the new file with the old one.
    age_attachments(&state).await;
    let second = quiz_attachment(&state, second_quiz).await.expect("attachment");
    let outcome = state
        .attachments()
        .change(Owner::Quiz(second_quiz), Some(&second), AttachmentChange::Upload(upload))
        .await
        .unwrap();
    assert_eq!(outcome, ChangeOutcome::Attached { storage_warning: false });

    let current = quiz_attachment(&state, second_quiz).await.expect("replacement");
    assert_ne!(current.id, second.id);
    assert!(state.config.uploads_dir.join(&current.resource).exists());
    assert!(!state.config.uploads_dir.join(&second.resource).exists());
}

#[tokio::test]
async fn registration_rejects_taken_usernames() {
    let (state, app, _) = app_with_user().await;
    let cookie = login(&app, "alice", "secret").await;

    let resp = send(
        &app,
        multipart("/users", &cookie, &[("username", "alice"), ("password", "pw")]),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("User &quot;alice&quot; already exists."));

    let resp = send(
        &app,
        multipart("/users", &cookie, &[("username", "bob"), ("password", "pw")]),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let bob = state.db.find_user_by_username("bob").await.unwrap().unwrap();
    assert_eq!(location(&resp), format!("/users/{}", bob.id));
}

#[tokio::test]
async fn users_can_delete_themselves_and_get_logged_out() {
    let (state, app, user_id) = app_with_user().await;
    let cookie = login(&app, "alice", "secret").await;

    let resp = send(&app, post(&format!("/users/{user_id}?_method=DELETE"), Some(&cookie), "")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(state.db.get_user(user_id).await.unwrap().is_none());

    let resp = send(&app, get("/users", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn new_token_replaces_the_old_one() {
    let (state, app, user_id) = app_with_user().await;
    let old = state.db.get_user(user_id).await.unwrap().unwrap().token;
    let cookie = login(&app, "alice", "secret").await;

    let resp = send(&app, post(&format!("/users/{user_id}/token?_method=PUT"), Some(&cookie), "")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/users/{user_id}"));

    let new = state.db.get_user(user_id).await.unwrap().unwrap().token;
    assert_ne!(new, old);
}
