pub const LOGIN_URL: &str = "/login";
pub const GO_BACK_URL: &str = "/goback";
pub const USERS_URL: &str = "/users";
pub const NEW_USER_URL: &str = "/users/new";
pub const QUIZZES_URL: &str = "/quizzes";
pub const NEW_QUIZ_URL: &str = "/quizzes/new";
pub const RANDOM_PLAY_URL: &str = "/quizzes/randomplay";
pub const AUTHOR_URL: &str = "/author";

pub const API_PREFIX: &str = "/api/";
pub const UPLOADS_URL: &str = "/uploads";

pub const SESSION_COOKIE_NAME: &str = "quizzery_session";

pub fn user_url(user_id: i64) -> String {
    format!("/users/{user_id}")
}

pub fn edit_user_url(user_id: i64) -> String {
    format!("/users/{user_id}/edit")
}

pub fn user_token_url(user_id: i64) -> String {
    format!("/users/{user_id}/token")
}

pub fn user_quizzes_url(user_id: i64) -> String {
    format!("/users/{user_id}/quizzes")
}

pub fn favourite_url(user_id: i64, quiz_id: i64) -> String {
    format!("/users/{user_id}/favourites/{quiz_id}")
}

pub fn quiz_url(quiz_id: i64) -> String {
    format!("/quizzes/{quiz_id}")
}

pub fn edit_quiz_url(quiz_id: i64) -> String {
    format!("/quizzes/{quiz_id}/edit")
}

pub fn play_quiz_url(quiz_id: i64) -> String {
    format!("/quizzes/{quiz_id}/play")
}

pub fn check_quiz_url(quiz_id: i64) -> String {
    format!("/quizzes/{quiz_id}/check")
}

pub fn random_check_url(quiz_id: i64) -> String {
    format!("/quizzes/randomcheck/{quiz_id}")
}

pub fn oauth_url(provider: &str) -> String {
    format!("/auth/{provider}")
}

pub fn oauth_callback_url(base_url: &str, provider: &str) -> String {
    format!("{}/auth/{provider}/callback", base_url.trim_end_matches('/'))
}

/// Appends `?_method=` so a POST form is dispatched as another verb.
pub fn with_method(url: &str, method: &str) -> String {
    format!("{url}?_method={method}")
}

// Listing defaults
pub const ITEMS_PER_PAGE: i64 = 10;
pub const QUIZZES_PER_DAY: i64 = 50;
pub const RANDOM_BATCH_SIZE: usize = 10;
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
