use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
}

/// Notification as shown to its receiver.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationView {
    pub id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub sender_id: Uuid,
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SendNotification {
    #[validate(length(min = 1, max = 2000, message = "Message is required"))]
    #[schema(example = "Shift starts at 9:00 tomorrow")]
    pub message: String,
    /// Omit to broadcast to every active volunteer (coordinators only)
    pub receiver_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SendOutcome {
    pub sent: u64,
}
