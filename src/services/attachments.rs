use chrono::{Duration, Utc};
use color_eyre::Result;

use crate::db::models::{AttachmentModel, NewAttachment};
use crate::db::Db;
use crate::storage::Storage;

/// An attachment cannot be replaced or removed until this many seconds
/// after its last edit.
pub const REPLACE_COOLDOWN_SECS: i64 = 60;

/// The record an attachment belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    Quiz(i64),
    /// A user's profile photo.
    User(i64),
}

/// A file received from a form.
#[derive(Clone, Debug)]
pub struct Upload {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Where the external store put an upload.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredMedia {
    pub resource: String,
    pub url: String,
}

/// What an edit form asks for.
pub enum AttachmentChange {
    Keep,
    Remove,
    Upload(Upload),
}

#[derive(Debug, PartialEq)]
pub enum ChangeOutcome {
    Unchanged,
    Attached { storage_warning: bool },
    Removed { storage_warning: bool },
    /// The cool-down has not elapsed. The current attachment is kept.
    TooSoon,
}

#[cfg_attr(test, mockall::automock)]
pub trait MediaStore: Send + Sync {
    fn store(
        &self,
        upload: &Upload,
    ) -> impl std::future::Future<Output = Result<StoredMedia>> + Send;

    fn remove(&self, resource: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait AttachmentRepository: Send + Sync {
    fn create_attachment(
        &self,
        new: &NewAttachment,
    ) -> impl std::future::Future<Output = Result<AttachmentModel>> + Send;

    fn delete_attachment(
        &self,
        attachment_id: i64,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Points the owner at the attachment, or at nothing.
    fn link(
        &self,
        owner: Owner,
        attachment_id: Option<i64>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn delete_owner(&self, owner: Owner) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl AttachmentRepository for Db {
    async fn create_attachment(&self, new: &NewAttachment) -> Result<AttachmentModel> {
        Db::create_attachment(self, new).await
    }

    async fn delete_attachment(&self, attachment_id: i64) -> Result<()> {
        Db::delete_attachment(self, attachment_id).await
    }

    async fn link(&self, owner: Owner, attachment_id: Option<i64>) -> Result<()> {
        match owner {
            Owner::Quiz(quiz_id) => self.set_quiz_attachment(quiz_id, attachment_id).await,
            Owner::User(user_id) => self.set_user_photo(user_id, attachment_id).await,
        }
    }

    async fn delete_owner(&self, owner: Owner) -> Result<()> {
        match owner {
            Owner::Quiz(quiz_id) => self.delete_quiz(quiz_id).await,
            Owner::User(user_id) => self.delete_user(user_id).await,
        }
    }
}

pub struct AttachmentService<R: AttachmentRepository = Db, M: MediaStore = Storage> {
    repo: R,
    media: M,
}

impl<R: AttachmentRepository + Clone, M: MediaStore + Clone> Clone for AttachmentService<R, M> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            media: self.media.clone(),
        }
    }
}

impl<R: AttachmentRepository, M: MediaStore> AttachmentService<R, M> {
    pub fn new(repo: R, media: M) -> Self {
        Self { repo, media }
    }

    /// Uploads, records and links a new attachment. Anything created before
    /// a failing step is undone.
    pub async fn attach(&self, owner: Owner, upload: &Upload) -> Result<AttachmentModel> {
        let stored = self.media.store(upload).await?;

        let new = NewAttachment {
            resource: stored.resource,
            url: stored.url,
            filename: upload.filename.clone(),
            mime: upload.mime.clone(),
        };
        let attachment = match self.repo.create_attachment(&new).await {
            Ok(attachment) => attachment,
            Err(e) => {
                self.remove_external(&new.resource).await;
                return Err(e);
            }
        };

        if let Err(e) = self.repo.link(owner, Some(attachment.id)).await {
            self.remove_external(&attachment.resource).await;
            if let Err(e) = self.repo.delete_attachment(attachment.id).await {
                tracing::warn!("could not delete unlinked attachment {}: {e}", attachment.id);
            }
            return Err(e);
        }

        tracing::info!("attachment {} linked to {owner:?}", attachment.id);
        Ok(attachment)
    }

    /// Applies an edit form's attachment choice to an existing owner.
    pub async fn change(
        &self,
        owner: Owner,
        current: Option<&AttachmentModel>,
        change: AttachmentChange,
    ) -> Result<ChangeOutcome> {
        let upload = match change {
            AttachmentChange::Keep => return Ok(ChangeOutcome::Unchanged),
            AttachmentChange::Remove if current.is_none() => return Ok(ChangeOutcome::Unchanged),
            AttachmentChange::Remove => None,
            AttachmentChange::Upload(upload) => Some(upload),
        };

        if let Some(current) = current {
            if Utc::now() - current.updated_at < Duration::seconds(REPLACE_COOLDOWN_SECS) {
                tracing::debug!("attachment {} was edited too recently", current.id);
                return Ok(ChangeOutcome::TooSoon);
            }
        }

        match upload {
            Some(upload) => {
                self.attach(owner, &upload).await?;
                let storage_warning = match current {
                    Some(old) => !self.discard(old).await,
                    None => false,
                };
                Ok(ChangeOutcome::Attached { storage_warning })
            }
            None => {
                self.repo.link(owner, None).await?;
                let storage_warning = match current {
                    Some(old) => !self.discard(old).await,
                    None => false,
                };
                Ok(ChangeOutcome::Removed { storage_warning })
            }
        }
    }

    /// Deletes the external resource (best effort), then the attachment row,
    /// then the owner. Returns `false` when the external delete failed.
    pub async fn delete_owner(
        &self,
        owner: Owner,
        attachment: Option<&AttachmentModel>,
    ) -> Result<bool> {
        let mut storage_ok = true;
        if let Some(attachment) = attachment {
            storage_ok = self.remove_external(&attachment.resource).await;
            self.repo.delete_attachment(attachment.id).await?;
        }

        self.repo.delete_owner(owner).await?;
        Ok(storage_ok)
    }

    /// Drops an attachment that is no longer linked. Row errors are logged
    /// since the owner already moved on.
    async fn discard(&self, attachment: &AttachmentModel) -> bool {
        let storage_ok = self.remove_external(&attachment.resource).await;
        if let Err(e) = self.repo.delete_attachment(attachment.id).await {
            tracing::warn!("could not delete attachment row {}: {e}", attachment.id);
        }
        storage_ok
    }

    async fn remove_external(&self, resource: &str) -> bool {
        match self.media.remove(resource).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("could not remove stored media {resource}: {e}");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
