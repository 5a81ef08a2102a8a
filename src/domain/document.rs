//! Uploaded documents and their lookup tables.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "consent-form.pdf")]
    pub filename: String,
    #[schema(example = "application/pdf")]
    pub mimetype: String,
    #[serde(skip_serializing)]
    pub storage_path: String,
    #[schema(example = "OTHER")]
    pub doc_type: String,
    pub category_id: Option<Uuid>,
    pub resource_type_id: Option<Uuid>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub size_bytes: i64,
    pub downloads: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: Uuid,
    pub filename: String,
    pub mimetype: String,
    pub storage_path: String,
    pub doc_type: String,
    pub category_id: Option<Uuid>,
    pub resource_type_id: Option<Uuid>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub size_bytes: i64,
}

/// Metadata fields sent alongside the uploaded file.
#[derive(Debug, Clone, Default)]
pub struct UploadMetadata {
    pub doc_type: Option<String>,
    pub category_id: Option<Uuid>,
    pub resource_type_id: Option<Uuid>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

/// Uploaded file contents.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub mimetype: String,
    pub bytes: Vec<u8>,
}

/// Shared shape of the category and resource-type lookup tables.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Classification {
    pub id: Uuid,
    #[schema(example = "Consent forms")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationKind {
    Category,
    ResourceType,
}

impl ClassificationKind {
    pub fn label(&self) -> &'static str {
        match self {
            ClassificationKind::Category => "Category",
            ClassificationKind::ResourceType => "Resource type",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ClassificationInput {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
}

/// Split the comma-separated `tags` form field.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("constant pattern"));

/// Keep only characters that are safe in a file name.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_empty_ones_dropped() {
        assert_eq!(parse_tags(" legal, ,consent ,"), vec!["legal", "consent"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn filenames_lose_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\my form (1).pdf"), "my_form__1_.pdf");
        assert_eq!(sanitize_filename(".."), "file");
    }
}
