//! OpenAPI documentation served through Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    activity_handler, auth_handler, dashboard_handler, document_handler, health_handler,
    notification_handler, project_handler, skill_handler, user_handler, work_log_handler,
};
use crate::domain::{
    Activity, ActivityListItem, ActivityStats, AddVolunteer, Classification,
    ClassificationInput, CreateActivity, CreateProject, CreateUser, CreateWorkLog,
    DashboardStats, Document, DurationParts, LifecycleStatus, MoveActivity, NotificationView,
    Project, ProjectDetails, ProjectVolunteer, Role, SendNotification, SendOutcome, Skill,
    SkillEntry, SkillInput, StatusCount, UpdateActivity, UpdateProject, UpdateUser, UpdateWorkLog,
    UserResponse, UserSummary, UserWithHours, VolunteerRef, WorkLog, WorkLogStatus,
};
use crate::services::{LoginResponse, Profile, TokenResponse};
use crate::types::{MessageResponse, PaginationMeta, UserPage};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Voluntalia API",
        version = "0.1.0",
        description = "Volunteer management: projects, activities, work-log approval, documents and notifications"
    ),
    servers((url = "http://localhost:4000", description = "Local development server")),
    paths(
        health_handler::root,
        health_handler::health,
        auth_handler::register,
        auth_handler::login,
        auth_handler::refresh,
        auth_handler::logout,
        auth_handler::me,
        auth_handler::forgot_password,
        auth_handler::reset_password,
        user_handler::list_users,
        user_handler::get_user,
        user_handler::create_user,
        user_handler::update_user,
        project_handler::create_project,
        project_handler::list_projects,
        project_handler::get_project,
        project_handler::update_project,
        project_handler::delete_project,
        project_handler::add_volunteer,
        project_handler::remove_volunteer,
        project_handler::move_activity,
        activity_handler::create_activity,
        activity_handler::list_activities,
        activity_handler::activity_stats,
        activity_handler::get_activity,
        activity_handler::update_activity,
        activity_handler::delete_activity,
        activity_handler::assign_volunteer,
        activity_handler::unassign_volunteer,
        activity_handler::list_volunteers,
        work_log_handler::create_work_log,
        work_log_handler::my_work_logs,
        work_log_handler::pending_work_logs,
        work_log_handler::user_work_logs,
        work_log_handler::update_work_log,
        work_log_handler::delete_work_log,
        work_log_handler::approve_work_log,
        work_log_handler::unapprove_work_log,
        skill_handler::list_skills,
        skill_handler::create_skill,
        skill_handler::rename_skill,
        skill_handler::delete_skill,
        skill_handler::assign_skill,
        skill_handler::unassign_skill,
        document_handler::upload_document,
        document_handler::list_documents,
        document_handler::list_categories,
        document_handler::create_category,
        document_handler::list_resource_types,
        document_handler::create_resource_type,
        document_handler::download_document,
        notification_handler::send_notification,
        notification_handler::list_notifications,
        notification_handler::mark_read,
        dashboard_handler::dashboard_stats,
    ),
    components(
        schemas(
            Role,
            LifecycleStatus,
            WorkLogStatus,
            DurationParts,
            UserResponse,
            UserSummary,
            UserWithHours,
            UserPage,
            PaginationMeta,
            CreateUser,
            UpdateUser,
            Project,
            ProjectDetails,
            ProjectVolunteer,
            CreateProject,
            UpdateProject,
            AddVolunteer,
            MoveActivity,
            Activity,
            ActivityListItem,
            ActivityStats,
            CreateActivity,
            UpdateActivity,
            VolunteerRef,
            WorkLog,
            CreateWorkLog,
            UpdateWorkLog,
            Skill,
            SkillEntry,
            SkillInput,
            Document,
            Classification,
            ClassificationInput,
            NotificationView,
            SendNotification,
            SendOutcome,
            DashboardStats,
            StatusCount,
            MessageResponse,
            TokenResponse,
            LoginResponse,
            Profile,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::RefreshRequest,
            auth_handler::ForgotPasswordRequest,
            auth_handler::ResetPasswordRequest,
            document_handler::UploadForm,
            health_handler::HealthResponse,
            health_handler::ServiceHealth,
            health_handler::ServiceStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and dependency status"),
        (name = "Authentication", description = "Sign-up, sessions and password recovery"),
        (name = "Users", description = "Account administration (coordinators)"),
        (name = "Projects", description = "Projects and their volunteers"),
        (name = "Activities", description = "Activities within projects"),
        (name = "Work logs", description = "Time tracking and approval"),
        (name = "Skills", description = "Skill catalogue"),
        (name = "Documents", description = "Uploaded documents"),
        (name = "Notifications", description = "In-app messages"),
        (name = "Dashboard", description = "Scoped statistics")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_group_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/users/{id}",
            "/projects/{id}/volunteers/{user_id}",
            "/activity/{id}/assign",
            "/worklog/{id}/approve",
            "/skill",
            "/document/{id}/download",
            "/notification/{id}/read",
            "/dashboard/stats",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{} missing", path);
        }
    }
}
