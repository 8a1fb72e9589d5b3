use axum::{
    extract::Path,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use include_dir::{include_dir, Dir};

static STATIC_DIR: Dir = include_dir!("static");
const STATIC_CACHE_CONTROL: &str = "max-age=3600, must-revalidate";

async fn send_file(Path(path): Path<String>) -> Response {
    let Some(file) = STATIC_DIR.get_file(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let content_type = mime_guess::from_path(file.path()).first_or_octet_stream();

    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (CACHE_CONTROL, STATIC_CACHE_CONTROL.to_string()),
        ],
        file.contents(),
    )
        .into_response()
}

/// Assets embedded at build time, meant to be nested under `/static`.
pub fn routes() -> Router {
    Router::new().route("/{*path}", get(send_file))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn serves_embedded_css() {
        let res = routes()
            .oneshot(Request::get("/index.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/css");
    }

    #[tokio::test]
    async fn unknown_asset_is_not_found() {
        let res = routes()
            .oneshot(Request::get("/nope.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
