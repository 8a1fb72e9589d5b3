pub mod api;
pub mod favourites;
pub mod homepage;
pub mod quizzes;
pub mod random_play;
pub mod session;
pub mod users;

use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart},
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use crate::{
    db::QuizFilter,
    extractors::PageCtx,
    names,
    rejections::AppError,
    services::attachments::{AttachmentChange, ChangeOutcome, Upload},
    session::{FlashKind, Session},
    utils, views,
};

pub async fn not_found(ctx: PageCtx) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        views::render(&ctx, "Not found", views::homepage::not_found()),
    )
}

/// Redirect to the saved "go back" URL.
pub fn go_back() -> Redirect {
    Redirect::to(names::GO_BACK_URL)
}

/// Saves the current URL as the "go back" destination.
pub fn remember_back(session: &Session, uri: &Uri) {
    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    session.set_back_url(url);
}

/// Body limit for routes taking an upload. The form fields around the file
/// get some room on top of the file limit, which [`read_multipart`] enforces.
pub fn upload_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(names::MAX_UPLOAD_BYTES + 1024 * 1024)
}

/// Query of the quiz listings, shared by the pages and the API.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub searchfavourites: Option<String>,
    pub pageno: Option<i64>,
}

impl ListQuery {
    pub fn favourites(&self) -> bool {
        matches!(self.searchfavourites.as_deref(), Some("true" | "on" | "1"))
    }

    /// Favourites can only be searched by a known viewer.
    pub fn filter(&self, author_id: Option<i64>, viewer_id: Option<i64>) -> QuizFilter {
        QuizFilter {
            search: self.search.clone(),
            author_id,
            favourites_of: viewer_id.filter(|_| self.favourites()),
        }
    }
}

/// Flashes what happened to an attachment on an edit form.
pub fn flash_change(session: &Session, outcome: &ChangeOutcome, what: &str) {
    match outcome {
        ChangeOutcome::Unchanged => {}
        ChangeOutcome::TooSoon => session.flash(
            FlashKind::Error,
            format!("{what} file can not be modified until 1 minute has passed."),
        ),
        ChangeOutcome::Attached { storage_warning } | ChangeOutcome::Removed { storage_warning } => {
            if *storage_warning {
                session.flash(FlashKind::Info, "The previous file could not be deleted from storage.");
            }
        }
    }
}

/// Page bounds for a listing.
pub struct PageWindow {
    pub pageno: i64,
    pub offset: i64,
    pub total_pages: i64,
}

impl PageWindow {
    /// Clamps the requested page into the available range.
    pub fn clamped(requested: Option<i64>, count: i64) -> Self {
        let total_pages = utils::total_pages(count, names::ITEMS_PER_PAGE);
        let pageno = requested.unwrap_or(1).clamp(1, total_pages.max(1));
        Self::at(pageno, total_pages)
    }

    /// Any page number from 1 up, even past the end.
    pub fn unclamped(requested: Option<i64>, count: i64) -> Self {
        let total_pages = utils::total_pages(count, names::ITEMS_PER_PAGE);
        Self::at(requested.unwrap_or(1).max(1), total_pages)
    }

    fn at(pageno: i64, total_pages: i64) -> Self {
        Self {
            pageno,
            offset: (pageno - 1).saturating_mul(names::ITEMS_PER_PAGE),
            total_pages,
        }
    }
}

/// Text fields and the optional file of a multipart form.
pub struct FormData {
    fields: HashMap<String, String>,
    pub file: Option<Upload>,
}

impl FormData {
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn checked(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// What an edit form asks for the current attachment.
    pub fn attachment_change(&mut self, keep_field: &str) -> AttachmentChange {
        match self.file.take() {
            Some(upload) => AttachmentChange::Upload(upload),
            None if self.checked(keep_field) => AttachmentChange::Keep,
            None => AttachmentChange::Remove,
        }
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("upload rejected: {e}");
        return AppError::PayloadTooLarge;
    }
    tracing::warn!("failed to read multipart field: {e}");
    AppError::Input("failed to read multipart field")
}

/// Reads a multipart form. `file_field` names the one file input.
pub async fn read_multipart(mut multipart: Multipart, file_field: &str) -> Result<FormData, AppError> {
    let mut fields = HashMap::new();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == file_field {
            let filename = field.file_name().unwrap_or_default().to_string();
            let mime = field
                .content_type()
                .filter(|m| !m.is_empty() && *m != "application/octet-stream")
                .map(str::to_string)
                .unwrap_or_else(|| {
                    mime_guess::from_path(&filename)
                        .first_or_octet_stream()
                        .to_string()
                });
            let bytes = field.bytes().await.map_err(multipart_error)?;

            if bytes.len() > names::MAX_UPLOAD_BYTES {
                return Err(AppError::PayloadTooLarge);
            }
            if !filename.is_empty() && !bytes.is_empty() {
                file = Some(Upload {
                    filename,
                    mime,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let text = field.text().await.map_err(multipart_error)?;
        fields.insert(name, text);
    }

    Ok(FormData { fields, file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_clamps_into_range() {
        let window = PageWindow::clamped(Some(9), 25);
        assert_eq!(window.pageno, 3);
        assert_eq!(window.offset, 20);
        assert_eq!(window.total_pages, 3);

        let empty = PageWindow::clamped(Some(0), 0);
        assert_eq!(empty.pageno, 1);
        assert_eq!(empty.offset, 0);
    }

    #[test]
    fn favourites_filter_needs_a_viewer() {
        let query = ListQuery {
            search: Some("paris".to_string()),
            searchfavourites: Some("true".to_string()),
            pageno: None,
        };
        assert_eq!(query.filter(None, Some(3)).favourites_of, Some(3));
        assert_eq!(query.filter(Some(7), None).favourites_of, None);
        assert_eq!(query.filter(Some(7), None).author_id, Some(7));

        let plain = ListQuery::default();
        assert_eq!(plain.filter(None, Some(3)).favourites_of, None);
    }

    #[test]
    fn unclamped_window_allows_pages_past_the_end() {
        let window = PageWindow::unclamped(Some(5), 25);
        assert_eq!(window.pageno, 5);
        assert_eq!(window.offset, 40);

        let far = PageWindow::unclamped(Some(i64::MAX), 25);
        assert_eq!(far.pageno, i64::MAX);
        assert_eq!(far.offset, i64::MAX);
    }
}
