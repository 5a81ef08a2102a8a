//! Document uploads, listing and downloads.
//!
//! Bytes live in a [`FileStore`]; rows reference them by storage path. A
//! failed insert removes the stored file again.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::DEFAULT_DOCUMENT_TYPE;
use crate::domain::policy::{can_view_all_documents, require_role};
use crate::domain::{
    Actor, Classification, ClassificationKind, Document, NewDocument, Role, UploadMetadata,
    UploadedFile,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{FileStore, TransactionContext, UnitOfWork};

#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn upload(
        &self,
        actor: Actor,
        file: UploadedFile,
        metadata: UploadMetadata,
    ) -> AppResult<Document>;

    /// Every document for coordinators and legal staff, otherwise the actor's own.
    async fn list(&self, actor: Actor) -> AppResult<Vec<Document>>;

    async fn classifications(&self, kind: ClassificationKind) -> AppResult<Vec<Classification>>;

    async fn create_classification(
        &self,
        actor: Actor,
        kind: ClassificationKind,
        name: String,
    ) -> AppResult<Classification>;

    /// Document row and file contents; counts the download.
    async fn download(&self, actor: Actor, id: Uuid) -> AppResult<(Document, Vec<u8>)> {
        let document = self
            .uow
            .read(move |tx| {
                Box::pin(async move {
                    let document = tx
                        .documents()
                        .find_by_id(id)
                        .await?
                        .ok_or_not_found("Document")?;
                    if document.user_id != actor.id && !can_view_all_documents(&actor) {
                        return Err(AppError::forbidden(
                            "You do not have access to this document",
                        ));
                    }
                    Ok(document)
                })
            })
            .await?;

        // Only a delivered file counts as a download.
        let bytes = self.files.read(&document.storage_path).await?;
        self.uow
            .transaction(move |tx| {
                Box::pin(async move { tx.documents().increment_downloads(id).await })
            })
            .await?;

        tracing::debug!(document_id = %id, user_id = %actor.id, "Document downloaded");
        Ok((document, bytes))
    }
}
