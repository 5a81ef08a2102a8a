//! Document metadata. Tags are stored as a JSON array of strings.

use sea_orm::entity::prelude::*;

use crate::domain::Document;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub mimetype: String,
    pub storage_path: String,
    pub doc_type: String,
    pub category_id: Option<Uuid>,
    pub resource_type_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub size_bytes: i64,
    pub downloads: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Document {
    fn from(model: Model) -> Self {
        let tags = serde_json::from_value(model.tags).unwrap_or_default();
        Document {
            id: model.id,
            user_id: model.user_id,
            filename: model.filename,
            mimetype: model.mimetype,
            storage_path: model.storage_path,
            doc_type: model.doc_type,
            category_id: model.category_id,
            resource_type_id: model.resource_type_id,
            description: model.description,
            tags,
            size_bytes: model.size_bytes,
            downloads: model.downloads,
            created_at: model.created_at,
        }
    }
}
