//! Database model structs.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Account type of users who registered with a password.
pub const LOCAL_ACCOUNT: i64 = 0;

/// The logged-in user, as carried by request extractors.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub account_type_id: i64,
}

impl AuthUser {
    pub fn is_local(&self) -> bool {
        self.account_type_id == LOCAL_ACCOUNT
    }

    /// Admins manage everything, other users only what they own.
    pub fn can_manage(&self, owner_id: Option<i64>) -> bool {
        self.is_admin || owner_id == Some(self.id)
    }
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct AttachmentModel {
    pub id: i64,
    pub resource: String,
    pub url: String,
    pub filename: String,
    pub mime: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttachmentModel {
    pub fn media(&self) -> Media {
        Media {
            filename: self.filename.clone(),
            mime: self.mime.clone(),
            url: self.url.clone(),
        }
    }
}

pub struct NewAttachment {
    pub resource: String,
    pub url: String,
    pub filename: String,
    pub mime: String,
}

/// Public view of an attachment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Media {
    pub filename: String,
    pub mime: String,
    pub url: String,
}

impl Media {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Public view of a user, used both for user listings and quiz authors.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub is_admin: bool,
    pub username: String,
    pub account_type_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    pub photo: Option<Media>,
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub account_type_id: i64,
    pub profile_id: Option<String>,
    pub profile_name: Option<String>,
    pub token: Option<String>,
    pub photo: Option<AttachmentModel>,
}

impl User {
    pub fn is_local(&self) -> bool {
        self.account_type_id == LOCAL_ACCOUNT
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            is_admin: self.is_admin,
            username: self.username.clone(),
            account_type_id: self.account_type_id,
            profile_name: self.profile_name.clone(),
            photo: self.photo.as_ref().map(AttachmentModel::media),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    username: String,
    is_admin: bool,
    account_type_id: i64,
    profile_id: Option<String>,
    profile_name: Option<String>,
    token: Option<String>,
    photo_id: Option<i64>,
    photo_resource: Option<String>,
    photo_url: Option<String>,
    photo_filename: Option<String>,
    photo_mime: Option<String>,
    photo_created_at: Option<DateTime<Utc>>,
    photo_updated_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let photo = attachment_from_parts(
            row.photo_id,
            row.photo_resource,
            row.photo_url,
            row.photo_filename,
            row.photo_mime,
            row.photo_created_at,
            row.photo_updated_at,
        );
        User {
            id: row.id,
            username: row.username,
            is_admin: row.is_admin,
            account_type_id: row.account_type_id,
            profile_id: row.profile_id,
            profile_name: row.profile_name,
            token: row.token,
            photo,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Quiz {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub author: Option<UserProfile>,
    pub attachment: Option<AttachmentModel>,
    /// Whether the viewing user is a fan. Derived per query, never stored.
    pub favourite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    pub fn author_id(&self) -> Option<i64> {
        self.author.as_ref().map(|a| a.id)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct QuizRow {
    id: i64,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: Option<i64>,
    author_username: Option<String>,
    author_is_admin: Option<bool>,
    author_account_type_id: Option<i64>,
    author_profile_name: Option<String>,
    author_photo_filename: Option<String>,
    author_photo_mime: Option<String>,
    author_photo_url: Option<String>,
    attachment_id: Option<i64>,
    attachment_resource: Option<String>,
    attachment_url: Option<String>,
    attachment_filename: Option<String>,
    attachment_mime: Option<String>,
    attachment_created_at: Option<DateTime<Utc>>,
    attachment_updated_at: Option<DateTime<Utc>>,
    favourite: bool,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        let author = match (row.author_id, row.author_username) {
            (Some(id), Some(username)) => Some(UserProfile {
                id,
                username,
                is_admin: row.author_is_admin.unwrap_or(false),
                account_type_id: row.author_account_type_id.unwrap_or(LOCAL_ACCOUNT),
                profile_name: row.author_profile_name,
                photo: match (
                    row.author_photo_filename,
                    row.author_photo_mime,
                    row.author_photo_url,
                ) {
                    (Some(filename), Some(mime), Some(url)) => Some(Media { filename, mime, url }),
                    _ => None,
                },
            }),
            _ => None,
        };

        let attachment = attachment_from_parts(
            row.attachment_id,
            row.attachment_resource,
            row.attachment_url,
            row.attachment_filename,
            row.attachment_mime,
            row.attachment_created_at,
            row.attachment_updated_at,
        );

        Quiz {
            id: row.id,
            question: row.question,
            answer: row.answer,
            author,
            attachment,
            favourite: row.favourite,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn attachment_from_parts(
    id: Option<i64>,
    resource: Option<String>,
    url: Option<String>,
    filename: Option<String>,
    mime: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
) -> Option<AttachmentModel> {
    Some(AttachmentModel {
        id: id?,
        resource: resource?,
        url: url?,
        filename: filename?,
        mime: mime?,
        created_at: created_at?,
        updated_at: updated_at?,
    })
}
