//! Document metadata and the category / resource-type lookups.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::document::{self, ActiveModel, Entity as DocumentEntity};
use super::entities::{document_category, document_resource_type};
use crate::domain::{Classification, ClassificationKind, Document, NewDocument};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: NewDocument) -> AppResult<Document>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>>;

    /// Newest first; only `owner`'s documents when given.
    async fn list(&self, owner: Option<Uuid>) -> AppResult<Vec<Document>>;

    async fn increment_downloads(&self, id: Uuid) -> AppResult<()>;

    async fn classifications(&self, kind: ClassificationKind) -> AppResult<Vec<Classification>>;

    async fn find_classification(
        &self,
        kind: ClassificationKind,
        id: Uuid,
    ) -> AppResult<Option<Classification>>;

    async fn find_classification_by_name(
        &self,
        kind: ClassificationKind,
        name: &str,
    ) -> AppResult<Option<Classification>>;

    async fn create_classification(
        &self,
        kind: ClassificationKind,
        name: String,
    ) -> AppResult<Classification>;
}

pub struct DocumentStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> DocumentStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl DocumentRepository for DocumentStore<'_> {
    async fn create(&self, new_document: NewDocument) -> AppResult<Document> {
        let tags = serde_json::to_value(&new_document.tags)
            .map_err(|e| AppError::internal(format!("Tag encoding failed: {}", e)))?;
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new_document.user_id),
            filename: Set(new_document.filename),
            mimetype: Set(new_document.mimetype),
            storage_path: Set(new_document.storage_path),
            doc_type: Set(new_document.doc_type),
            category_id: Set(new_document.category_id),
            resource_type_id: Set(new_document.resource_type_id),
            description: Set(new_document.description),
            tags: Set(tags),
            size_bytes: Set(new_document.size_bytes),
            downloads: Set(0),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(self.txn)
        .await?;
        Ok(Document::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        let model = DocumentEntity::find_by_id(id).one(self.txn).await?;
        Ok(model.map(Document::from))
    }

    async fn list(&self, owner: Option<Uuid>) -> AppResult<Vec<Document>> {
        let mut select = DocumentEntity::find().order_by_desc(document::Column::CreatedAt);
        if let Some(owner) = owner {
            select = select.filter(document::Column::UserId.eq(owner));
        }
        let models = select.all(self.txn).await?;
        Ok(models.into_iter().map(Document::from).collect())
    }

    async fn increment_downloads(&self, id: Uuid) -> AppResult<()> {
        DocumentEntity::update_many()
            .col_expr(
                document::Column::Downloads,
                Expr::col(document::Column::Downloads).add(1),
            )
            .filter(document::Column::Id.eq(id))
            .exec(self.txn)
            .await?;
        Ok(())
    }

    async fn classifications(&self, kind: ClassificationKind) -> AppResult<Vec<Classification>> {
        let rows = match kind {
            ClassificationKind::Category => document_category::Entity::find()
                .order_by_asc(document_category::Column::Name)
                .all(self.txn)
                .await?
                .into_iter()
                .map(Classification::from)
                .collect(),
            ClassificationKind::ResourceType => document_resource_type::Entity::find()
                .order_by_asc(document_resource_type::Column::Name)
                .all(self.txn)
                .await?
                .into_iter()
                .map(Classification::from)
                .collect(),
        };
        Ok(rows)
    }

    async fn find_classification(
        &self,
        kind: ClassificationKind,
        id: Uuid,
    ) -> AppResult<Option<Classification>> {
        let found = match kind {
            ClassificationKind::Category => document_category::Entity::find_by_id(id)
                .one(self.txn)
                .await?
                .map(Classification::from),
            ClassificationKind::ResourceType => document_resource_type::Entity::find_by_id(id)
                .one(self.txn)
                .await?
                .map(Classification::from),
        };
        Ok(found)
    }

    async fn find_classification_by_name(
        &self,
        kind: ClassificationKind,
        name: &str,
    ) -> AppResult<Option<Classification>> {
        let found = match kind {
            ClassificationKind::Category => document_category::Entity::find()
                .filter(document_category::Column::Name.eq(name))
                .one(self.txn)
                .await?
                .map(Classification::from),
            ClassificationKind::ResourceType => document_resource_type::Entity::find()
                .filter(document_resource_type::Column::Name.eq(name))
                .one(self.txn)
                .await?
                .map(Classification::from),
        };
        Ok(found)
    }

    async fn create_classification(
        &self,
        kind: ClassificationKind,
        name: String,
    ) -> AppResult<Classification> {
        let id = Uuid::new_v4();
        let created = match kind {
            ClassificationKind::Category => document_category::ActiveModel {
                id: Set(id),
                name: Set(name),
            }
            .insert(self.txn)
            .await
            .map(Classification::from)?,
            ClassificationKind::ResourceType => document_resource_type::ActiveModel {
                id: Set(id),
                name: Set(name),
            }
            .insert(self.txn)
            .await
            .map(Classification::from)?,
        };
        Ok(created)
    }
}
