//! Domain layer - Core business entities and rules
//!
//! Pure types and functions: the authorization table, the work-log state
//! machine, activity/project consistency checks and scoped aggregates.
//! Nothing here touches the database.

pub mod activity;
pub mod document;
pub mod notification;
pub mod password;
pub mod policy;
pub mod project;
pub mod role;
pub mod skill;
pub mod stats;
pub mod status;
pub mod token;
pub mod user;
pub mod worklog;

pub use activity::{
    Activity, ActivityFilter, ActivityListItem, ActivityQuery, CreateActivity, MoveActivity,
    NewActivity, UpdateActivity, VolunteerRef,
};
pub use document::{
    Classification, ClassificationInput, ClassificationKind, Document, NewDocument,
    UploadMetadata, UploadedFile,
};
pub use notification::{
    NewNotification, Notification, NotificationView, SendNotification, SendOutcome,
};
pub use password::Password;
pub use policy::{Action, Decision, Target};
pub use project::{
    AddVolunteer, CreateProject, Membership, NewProject, Project, ProjectDetails,
    ProjectVolunteer, UpdateProject,
};
pub use role::{Actor, Role};
pub use skill::{Skill, SkillEntry, SkillInput};
pub use stats::{ActivityStats, DashboardStats, StatusCount, Visibility};
pub use status::LifecycleStatus;
pub use token::{PasswordResetToken, RefreshToken};
pub use user::{
    CreateUser, NewUser, UpdateUser, User, UserChanges, UserResponse, UserSummary, UserWithHours,
};
pub use worklog::{
    CreateWorkLog, DurationParts, NewWorkLog, UpdateWorkLog, WorkDuration, WorkLog,
    WorkLogQuery, WorkLogStatus,
};
