//! Project, activity and work-log flows over the in-memory unit of work.

mod common;

use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

use common::Harness;
use voluntalia_api::domain::{
    Activity, Actor, CreateActivity, CreateProject, CreateWorkLog, LifecycleStatus, Project, Role,
    UpdateActivity, UpdateProject, UpdateUser, User, WorkDuration, WorkLog, WorkLogStatus,
};
use voluntalia_api::errors::AppError;
use voluntalia_api::services::ServiceContainer;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn actor(user: &User) -> Actor {
    Actor::new(user.id, user.role)
}

struct Team {
    harness: Harness,
    coordinator: User,
    manager: User,
    volunteer: User,
}

impl Team {
    fn new() -> Self {
        let harness = Harness::new();
        let coordinator = harness.store.seed_user("Carla Coordinator", Role::Coordinator);
        let manager = harness.store.seed_user("Manu Manager", Role::ProjectManager);
        let volunteer = harness.store.seed_user("Vera Volunteer", Role::Volunteer);
        Self {
            harness,
            coordinator,
            manager,
            volunteer,
        }
    }

    async fn project(&self, name: &str, manager: &User) -> Project {
        self.harness
            .services
            .projects()
            .create(
                actor(&self.coordinator),
                CreateProject {
                    name: name.to_string(),
                    description: None,
                    manager_id: Some(manager.id),
                    start_date: Some(date(2025, 3, 1)),
                    end_date: None,
                    status: None,
                },
            )
            .await
            .unwrap()
    }

    async fn activity(&self, by: &User, project: &Project, title: &str) -> Result<Activity, AppError> {
        self.harness
            .services
            .activities()
            .create(
                actor(by),
                CreateActivity {
                    title: title.to_string(),
                    description: None,
                    date: date(2025, 3, 15),
                    project_id: project.id,
                    status: None,
                },
            )
            .await
    }

    async fn join(&self, project: &Project, user: &User) {
        self.harness
            .services
            .projects()
            .add_volunteer(actor(&self.coordinator), project.id, user.id)
            .await
            .unwrap();
    }

    async fn log(&self, user: &User, activity: &Activity, week_start: NaiveDate) -> WorkLog {
        self.harness
            .services
            .work_logs()
            .create(
                actor(user),
                CreateWorkLog {
                    activity_id: Some(activity.id),
                    week_start,
                    hours: WorkDuration::from_minutes(150).unwrap(),
                    notes: Some("Sorted donations".into()),
                },
            )
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn manager_approves_volunteer_time_on_managed_project() {
    let team = Team::new();
    let services = &team.harness.services;

    let project = team.project("Food Drive", &team.manager).await;
    assert_eq!(project.status, LifecycleStatus::Planned);
    assert_eq!(project.manager_id, Some(team.manager.id));

    let activity = team
        .activity(&team.manager, &project, "Pack boxes")
        .await
        .unwrap();

    let denied = team.activity(&team.volunteer, &project, "Pack boxes").await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    services
        .projects()
        .add_volunteer(actor(&team.manager), project.id, team.volunteer.id)
        .await
        .unwrap();

    let log = team.log(&team.volunteer, &activity, date(2025, 3, 10)).await;
    assert_eq!(log.status, WorkLogStatus::Pending);

    let pending = services.work_logs().pending(actor(&team.manager)).await.unwrap();
    assert_eq!(pending.iter().map(|l| l.id).collect::<Vec<_>>(), vec![log.id]);

    let approved = services
        .work_logs()
        .approve(actor(&team.manager), log.id)
        .await
        .unwrap();
    assert_eq!(approved.status, WorkLogStatus::Approved);
    assert_eq!(approved.approved_by, Some(team.manager.id));
    assert!(approved.approved_at.is_some());

    let inbox = team.harness.store.notifications_for(team.volunteer.id);
    assert!(inbox.iter().any(|n| n.message.contains("approved")));
    assert!(inbox.iter().any(|n| n.message.contains("Food Drive")));
}

#[tokio::test]
async fn only_the_projects_manager_or_a_coordinator_may_approve() {
    let team = Team::new();
    let services = &team.harness.services;
    let other_manager = team
        .harness
        .store
        .seed_user("Otto Manager", Role::ProjectManager);

    let project = team.project("Food Drive", &team.manager).await;
    team.project("Book Fair", &other_manager).await;
    let activity = team.activity(&team.manager, &project, "Pack boxes").await.unwrap();
    team.join(&project, &team.volunteer).await;
    let log = team.log(&team.volunteer, &activity, date(2025, 3, 10)).await;

    for outsider in [&other_manager, &team.volunteer] {
        let result = services.work_logs().approve(actor(outsider), log.id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
    let stored = team.harness.store.work_log(log.id).unwrap();
    assert_eq!(stored.status, WorkLogStatus::Pending);
    assert_eq!(stored.approved_by, None);

    let approved = services
        .work_logs()
        .approve(actor(&team.coordinator), log.id)
        .await
        .unwrap();
    assert_eq!(approved.approved_by, Some(team.coordinator.id));

    let again = services.work_logs().approve(actor(&team.coordinator), log.id).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn unapprove_restores_a_pending_log() {
    let team = Team::new();
    let services = &team.harness.services;

    let project = team.project("Food Drive", &team.manager).await;
    let activity = team.activity(&team.manager, &project, "Pack boxes").await.unwrap();
    team.join(&project, &team.volunteer).await;
    let log = team.log(&team.volunteer, &activity, date(2025, 3, 10)).await;

    services.work_logs().approve(actor(&team.manager), log.id).await.unwrap();
    let restored = services
        .work_logs()
        .unapprove(actor(&team.manager), log.id)
        .await
        .unwrap();

    assert_eq!(restored.status, WorkLogStatus::Pending);
    assert_eq!(restored.approved_by, None);
    assert_eq!(restored.approved_at, None);

    let twice = services.work_logs().unapprove(actor(&team.manager), log.id).await;
    assert!(matches!(twice, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn approved_logs_are_frozen_for_their_owner() {
    let team = Team::new();
    let services = &team.harness.services;

    let project = team.project("Food Drive", &team.manager).await;
    let activity = team.activity(&team.manager, &project, "Pack boxes").await.unwrap();
    team.join(&project, &team.volunteer).await;
    let log = team.log(&team.volunteer, &activity, date(2025, 3, 10)).await;
    services.work_logs().approve(actor(&team.manager), log.id).await.unwrap();

    let deleted = services.work_logs().delete(actor(&team.volunteer), log.id).await;
    assert!(matches!(deleted, Err(AppError::Conflict(_))));
    assert!(team.harness.store.work_log(log.id).is_some());
}

#[tokio::test]
async fn volunteers_cannot_log_time_outside_their_projects() {
    let team = Team::new();
    let project = team.project("Food Drive", &team.manager).await;
    let activity = team.activity(&team.manager, &project, "Pack boxes").await.unwrap();

    let result = team
        .harness
        .services
        .work_logs()
        .create(
            actor(&team.volunteer),
            CreateWorkLog {
                activity_id: Some(activity.id),
                week_start: date(2025, 3, 10),
                hours: WorkDuration::from_minutes(60).unwrap(),
                notes: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn last_volunteer_can_only_be_removed_by_a_coordinator() {
    let team = Team::new();
    let services = &team.harness.services;
    let second = team.harness.store.seed_user("Sam Volunteer", Role::Volunteer);

    let project = team.project("Food Drive", &team.manager).await;
    team.join(&project, &team.volunteer).await;
    team.join(&project, &second).await;

    let remaining = services
        .projects()
        .remove_volunteer(actor(&team.manager), project.id, second.id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);

    let blocked = services
        .projects()
        .remove_volunteer(actor(&team.manager), project.id, team.volunteer.id)
        .await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    let emptied = services
        .projects()
        .remove_volunteer(actor(&team.coordinator), project.id, team.volunteer.id)
        .await
        .unwrap();
    assert!(emptied.is_empty());
}

#[tokio::test]
async fn activity_dates_cannot_precede_the_project_start() {
    let team = Team::new();
    let services = &team.harness.services;
    let project = team.project("Food Drive", &team.manager).await;

    let early = services
        .activities()
        .create(
            actor(&team.manager),
            CreateActivity {
                title: "Warm-up".into(),
                description: None,
                date: date(2025, 2, 28),
                project_id: project.id,
                status: None,
            },
        )
        .await;
    assert!(matches!(early, Err(AppError::BadRequest(_))));

    let on_start = services
        .activities()
        .create(
            actor(&team.manager),
            CreateActivity {
                title: "Kick-off".into(),
                description: None,
                date: date(2025, 3, 1),
                project_id: project.id,
                status: None,
            },
        )
        .await
        .unwrap();

    let moved_early = services
        .activities()
        .update(
            actor(&team.manager),
            on_start.id,
            UpdateActivity {
                date: Some(date(2025, 1, 1)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(moved_early, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn activity_titles_are_unique_per_project() {
    let team = Team::new();
    let food = team.project("Food Drive", &team.manager).await;
    let books = team.project("Book Fair", &team.manager).await;

    team.activity(&team.manager, &food, "Pack boxes").await.unwrap();
    let duplicate = team.activity(&team.manager, &food, "Pack boxes").await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    team.activity(&team.manager, &books, "Pack boxes").await.unwrap();
}

#[tokio::test]
async fn dashboard_is_scoped_to_managed_projects() {
    let team = Team::new();
    let services = &team.harness.services;
    let other_manager = team
        .harness
        .store
        .seed_user("Otto Manager", Role::ProjectManager);
    let other_volunteer = team.harness.store.seed_user("Olga Volunteer", Role::Volunteer);

    let food = team.project("Food Drive", &team.manager).await;
    let books = team.project("Book Fair", &other_manager).await;
    let packing = team.activity(&team.manager, &food, "Pack boxes").await.unwrap();
    team.activity(&other_manager, &books, "Shelve books").await.unwrap();
    team.join(&food, &team.volunteer).await;
    team.join(&books, &other_volunteer).await;

    let this_month = Utc::now().date_naive().with_day(1).unwrap();
    team.log(&team.volunteer, &packing, this_month).await;

    let stats = services.dashboard().stats(actor(&team.manager)).await.unwrap();
    assert_eq!(stats.total_volunteers, 1);
    assert_eq!(stats.pending_work_logs, 1);
    assert!((stats.hours_this_month - 2.5).abs() < f64::EPSILON);
    assert_eq!(stats.approved_hours_this_month, 0.0);

    let overall = services.dashboard().stats(actor(&team.coordinator)).await.unwrap();
    assert_eq!(overall.total_volunteers, 2);
    let projects: u64 = overall.projects_by_status.iter().map(|s| s.count).sum();
    assert_eq!(projects, 2);
}

#[tokio::test]
async fn failed_transactions_leave_no_trace() {
    let team = Team::new();
    let project = team.project("Food Drive", &team.manager).await;
    team.join(&project, &team.volunteer).await;

    // Second add fails after the lookup; the first membership must survive untouched.
    let again = team
        .harness
        .services
        .projects()
        .add_volunteer(actor(&team.coordinator), project.id, team.volunteer.id)
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let unknown = team
        .harness
        .services
        .projects()
        .add_volunteer(actor(&team.coordinator), project.id, Uuid::new_v4())
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let details = team
        .harness
        .services
        .projects()
        .get(actor(&team.coordinator), project.id)
        .await
        .unwrap();
    assert_eq!(details.volunteers.len(), 1);
    assert_eq!(team.harness.store.notifications_for(team.volunteer.id).len(), 1);
}

#[tokio::test]
async fn dashboard_counts_only_active_volunteers_among_members() {
    let team = Team::new();
    let services = &team.harness.services;
    let legal = team.harness.store.seed_user("Lea Legal", Role::Legal);
    let leaver = team.harness.store.seed_user("Lou Volunteer", Role::Volunteer);

    let food = team.project("Food Drive", &team.manager).await;
    team.join(&food, &team.volunteer).await;
    team.join(&food, &legal).await;
    team.join(&food, &leaver).await;
    services
        .users()
        .update(
            actor(&team.coordinator),
            leaver.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let scoped = services.dashboard().stats(actor(&team.manager)).await.unwrap();
    assert_eq!(scoped.total_volunteers, 1);

    let overall = services.dashboard().stats(actor(&team.coordinator)).await.unwrap();
    assert_eq!(overall.total_volunteers, 1);
}

#[tokio::test]
async fn only_coordinators_move_activities_between_projects() {
    let team = Team::new();
    let services = &team.harness.services;
    let food = team.project("Food Drive", &team.manager).await;
    let books = team.project("Book Fair", &team.manager).await;
    let packing = team.activity(&team.manager, &food, "Pack boxes").await.unwrap();

    let denied = services
        .activities()
        .update(
            actor(&team.manager),
            packing.id,
            UpdateActivity {
                title: Some("Renamed".into()),
                project_id: Some(books.id),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    let unchanged = services
        .activities()
        .get(actor(&team.coordinator), packing.id)
        .await
        .unwrap();
    assert_eq!(unchanged.project_id, food.id);
    assert_eq!(unchanged.title, "Pack boxes");

    // The destination's title and start-date rules apply to the moved activity.
    team.activity(&team.manager, &books, "Pack boxes").await.unwrap();
    let clash = services
        .activities()
        .update(
            actor(&team.coordinator),
            packing.id,
            UpdateActivity {
                project_id: Some(books.id),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));

    services
        .projects()
        .update(
            actor(&team.coordinator),
            books.id,
            UpdateProject {
                start_date: Some(Some(date(2025, 4, 1))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let too_early = services
        .activities()
        .update(
            actor(&team.coordinator),
            packing.id,
            UpdateActivity {
                title: Some("Sort cans".into()),
                project_id: Some(books.id),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(too_early, Err(AppError::BadRequest(_))));

    let moved = services
        .activities()
        .update(
            actor(&team.coordinator),
            packing.id,
            UpdateActivity {
                title: Some("Sort cans".into()),
                date: Some(date(2025, 4, 2)),
                project_id: Some(books.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.project_id, books.id);
    assert_eq!(moved.title, "Sort cans");
}

#[tokio::test]
async fn only_the_current_manager_may_reassign_a_project() {
    let team = Team::new();
    let services = &team.harness.services;
    let other_manager = team
        .harness
        .store
        .seed_user("Otto Manager", Role::ProjectManager);
    let food = team.project("Food Drive", &team.manager).await;

    let hijack = services
        .projects()
        .update(
            actor(&other_manager),
            food.id,
            UpdateProject {
                manager_id: Some(Some(other_manager.id)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(hijack, Err(AppError::Forbidden(_))));

    let handed_over = services
        .projects()
        .update(
            actor(&team.manager),
            food.id,
            UpdateProject {
                manager_id: Some(Some(other_manager.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(handed_over.manager_id, Some(other_manager.id));
}

#[tokio::test]
async fn managers_must_hold_a_managing_role() {
    let team = Team::new();
    let services = &team.harness.services;

    let created = services
        .projects()
        .create(
            actor(&team.coordinator),
            CreateProject {
                name: "Food Drive".into(),
                description: None,
                manager_id: Some(team.volunteer.id),
                start_date: None,
                end_date: None,
                status: None,
            },
        )
        .await;
    assert!(matches!(created, Err(AppError::Conflict(_))));

    let food = team.project("Food Drive", &team.manager).await;
    let updated = services
        .projects()
        .update(
            actor(&team.coordinator),
            food.id,
            UpdateProject {
                manager_id: Some(Some(team.volunteer.id)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(updated, Err(AppError::Conflict(_))));

    let details = services
        .projects()
        .get(actor(&team.coordinator), food.id)
        .await
        .unwrap();
    assert_eq!(details.project.manager_id, Some(team.manager.id));
}

#[tokio::test]
async fn logs_without_an_activity_are_reviewed_by_coordinators_only() {
    let team = Team::new();
    let services = &team.harness.services;
    let food = team.project("Food Drive", &team.manager).await;
    team.join(&food, &team.volunteer).await;

    let log = services
        .work_logs()
        .create(
            actor(&team.volunteer),
            CreateWorkLog {
                activity_id: None,
                week_start: date(2025, 3, 10),
                hours: WorkDuration::from_minutes(90).unwrap(),
                notes: None,
            },
        )
        .await
        .unwrap();

    let denied = services.work_logs().approve(actor(&team.manager), log.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    assert_eq!(
        team.harness.store.work_log(log.id).unwrap().status,
        WorkLogStatus::Pending
    );

    let approved = services
        .work_logs()
        .approve(actor(&team.coordinator), log.id)
        .await
        .unwrap();
    assert_eq!(approved.status, WorkLogStatus::Approved);
    assert_eq!(approved.approved_by, Some(team.coordinator.id));
}
