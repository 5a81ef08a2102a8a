//! Document upload and download handlers.

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::document::{parse_tags, sanitize_filename};
use crate::domain::{
    Classification, ClassificationInput, ClassificationKind, Document, UploadMetadata,
    UploadedFile,
};
use crate::errors::{AppError, AppResult};
use crate::types::Created;

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents).post(upload_document))
        .route("/categories", get(list_categories).post(create_category))
        .route("/types", get(list_resource_types).post(create_resource_type))
        .route("/:id/download", get(download_document))
}

/// Multipart form accepted by the upload endpoint (documentation only).
#[derive(serde::Deserialize, utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    #[serde(rename = "type")]
    #[schema(example = "CONSENT")]
    doc_type: Option<String>,
    category_id: Option<Uuid>,
    resource_type_id: Option<Uuid>,
    description: Option<String>,
    /// Comma-separated
    #[schema(example = "legal,2025")]
    tags: Option<String>,
}

async fn field_text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::bad_request(format!("Invalid form field: {}", e)))
}

fn parse_id(name: &str, raw: &str) -> AppResult<Option<Uuid>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(raw)
        .map(Some)
        .map_err(|_| AppError::bad_request(format!("{} must be a valid id", name)))
}

/// Upload a document
#[utoipa::path(
    post,
    path = "/document",
    tag = "Documents",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = Document),
        (status = 400, description = "Missing file or invalid metadata"),
        (status = 404, description = "Unknown category or resource type")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Created<Document>> {
    let mut file = None;
    let mut metadata = UploadMetadata::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = sanitize_filename(field.file_name().unwrap_or("file"));
                let mimetype = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Upload failed: {}", e)))?;
                file = Some(UploadedFile {
                    filename,
                    mimetype,
                    bytes: bytes.to_vec(),
                });
            }
            "type" => metadata.doc_type = Some(field_text(field).await?),
            "category_id" => {
                metadata.category_id = parse_id("category_id", &field_text(field).await?)?
            }
            "resource_type_id" => {
                metadata.resource_type_id =
                    parse_id("resource_type_id", &field_text(field).await?)?
            }
            "description" => {
                let text = field_text(field).await?;
                metadata.description = Some(text).filter(|d| !d.trim().is_empty());
            }
            "tags" => metadata.tags = parse_tags(&field_text(field).await?),
            other => tracing::debug!(field = %other, "Ignoring unknown upload field"),
        }
    }

    let file = file.ok_or_else(|| AppError::bad_request("A file is required"))?;
    let document = state
        .services
        .documents()
        .upload(current_user.actor(), file, metadata)
        .await?;
    Ok(Created(document))
}

/// Documents visible to the caller
#[utoipa::path(
    get,
    path = "/document",
    tag = "Documents",
    responses((status = 200, description = "Documents", body = [Document])),
    security(("bearer_auth" = []))
)]
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Document>>> {
    let documents = state
        .services
        .documents()
        .list(current_user.actor())
        .await?;
    Ok(Json(documents))
}

#[utoipa::path(
    get,
    path = "/document/categories",
    tag = "Documents",
    responses((status = 200, description = "Categories", body = [Classification])),
    security(("bearer_auth" = []))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Classification>>> {
    let categories = state
        .services
        .documents()
        .classifications(ClassificationKind::Category)
        .await?;
    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/document/categories",
    tag = "Documents",
    request_body = ClassificationInput,
    responses(
        (status = 201, description = "Category created", body = Classification),
        (status = 403, description = "Coordinators and legal staff only"),
        (status = 409, description = "Duplicate name")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ClassificationInput>,
) -> AppResult<Created<Classification>> {
    let category = state
        .services
        .documents()
        .create_classification(current_user.actor(), ClassificationKind::Category, payload.name)
        .await?;
    Ok(Created(category))
}

#[utoipa::path(
    get,
    path = "/document/types",
    tag = "Documents",
    responses((status = 200, description = "Resource types", body = [Classification])),
    security(("bearer_auth" = []))
)]
pub async fn list_resource_types(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Classification>>> {
    let types = state
        .services
        .documents()
        .classifications(ClassificationKind::ResourceType)
        .await?;
    Ok(Json(types))
}

#[utoipa::path(
    post,
    path = "/document/types",
    tag = "Documents",
    request_body = ClassificationInput,
    responses(
        (status = 201, description = "Resource type created", body = Classification),
        (status = 403, description = "Coordinators and legal staff only"),
        (status = 409, description = "Duplicate name")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_resource_type(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ClassificationInput>,
) -> AppResult<Created<Classification>> {
    let resource_type = state
        .services
        .documents()
        .create_classification(
            current_user.actor(),
            ClassificationKind::ResourceType,
            payload.name,
        )
        .await?;
    Ok(Created(resource_type))
}

/// Download a document's file
#[utoipa::path(
    get,
    path = "/document/{id}/download",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Document not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_document(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let (document, bytes) = state
        .services
        .documents()
        .download(current_user.actor(), id)
        .await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&document.filename)
    );
    Ok((
        [
            (header::CONTENT_TYPE, document.mimetype),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
