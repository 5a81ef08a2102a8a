//! In-memory persistence for service and API tests.
//!
//! `MemoryStore` implements every repository over one mutex-guarded state.
//! Transactions are serialized and restore a snapshot when the closure
//! fails, so rollback behaves like the SQL unit of work.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use voluntalia_api::config::Config;
use voluntalia_api::domain::{
    Activity, ActivityQuery, Classification, ClassificationKind, Document,
    Membership, NewActivity, NewDocument, NewNotification, NewProject, NewUser, NewWorkLog,
    Notification, Password, PasswordResetToken, Project, ProjectVolunteer, RefreshToken, Role, Skill, User,
    UserChanges, WorkLog, WorkLogQuery, WorkLogStatus,
};
use voluntalia_api::errors::{AppError, AppResult};
use voluntalia_api::infra::{
    ActivityRepository, DocumentRepository, FileStore, NotificationRepository, ProjectRepository,
    Repositories, SkillRepository, TokenRepository, TransactionContext, TxFuture, UnitOfWork,
    UserRepository, WorkLogRepository,
};
use voluntalia_api::services::{Delivery, EmailService, Services};
use voluntalia_api::types::PaginationParams;

#[derive(Debug, Clone)]
struct Member {
    project_id: Uuid,
    user_id: Uuid,
    assigned_at: DateTime<Utc>,
    assigned_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
struct State {
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<Member>,
    activities: Vec<Activity>,
    work_logs: Vec<WorkLog>,
    skills: Vec<Skill>,
    skill_users: Vec<(Uuid, Uuid)>,
    documents: Vec<Document>,
    categories: Vec<Classification>,
    resource_types: Vec<Classification>,
    notifications: Vec<Notification>,
    refresh_tokens: Vec<RefreshToken>,
    reset_tokens: Vec<PasswordResetToken>,
}

impl State {
    fn classifications(&mut self, kind: ClassificationKind) -> &mut Vec<Classification> {
        match kind {
            ClassificationKind::Category => &mut self.categories,
            ClassificationKind::ResourceType => &mut self.resource_types,
        }
    }
}

/// All repositories backed by one in-memory state.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    gate: tokio::sync::Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Insert an active user directly, bypassing the services.
    pub fn seed_user(&self, name: &str, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@voluntalia.test", name.to_lowercase().replace(' ', ".")),
            password_hash: String::new(),
            role,
            is_active: true,
            phone: None,
            city: None,
            country: None,
            created_at: now,
            updated_at: now,
        };
        self.state().users.push(user.clone());
        user
    }

    /// Seeded user able to sign in with `password`.
    pub fn seed_account(&self, name: &str, role: Role, password: &str) -> User {
        let mut user = self.seed_user(name, role);
        let hash = Password::new(password).unwrap().into_string();
        let mut state = self.state();
        let stored = state.users.iter_mut().find(|u| u.id == user.id).unwrap();
        stored.password_hash = hash.clone();
        user.password_hash = hash;
        user
    }

    pub fn work_log(&self, id: Uuid) -> Option<WorkLog> {
        self.state().work_logs.iter().find(|l| l.id == id).cloned()
    }

    pub fn notifications_for(&self, receiver_id: Uuid) -> Vec<Notification> {
        self.state()
            .notifications
            .iter()
            .filter(|n| n.receiver_id == receiver_id)
            .cloned()
            .collect()
    }

    pub fn document_count(&self) -> usize {
        self.state().documents.len()
    }

    async fn run<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let _serial = self.gate.lock().await;
        let snapshot = self.state().clone();
        let outcome = f(TransactionContext::new(self)).await;
        if outcome.is_err() {
            *self.state() = snapshot;
        }
        outcome
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.run(f).await
    }

    async fn read<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.run(f).await
    }
}

impl Repositories for MemoryStore {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn projects(&self) -> &dyn ProjectRepository {
        self
    }

    fn activities(&self) -> &dyn ActivityRepository {
        self
    }

    fn work_logs(&self) -> &dyn WorkLogRepository {
        self
    }

    fn skills(&self) -> &dyn SkillRepository {
        self
    }

    fn documents(&self) -> &dyn DocumentRepository {
        self
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        self
    }

    fn tokens(&self) -> &dyn TokenRepository {
        self
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        Ok(self
            .state()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            is_active: true,
            phone: user.phone,
            city: user.city,
            country: user.country,
            created_at: now,
            updated_at: now,
        };
        self.state().users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let mut state = self.state();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        if let Some(city) = changes.city {
            user.city = city;
        }
        if let Some(country) = changes.country {
            user.country = country;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list(&self, params: &PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let mut users = self.state().users.clone();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        let total = users.len() as u64;
        let page = users
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn count_active_by_role(&self, role: Role) -> AppResult<u64> {
        Ok(self
            .state()
            .users
            .iter()
            .filter(|u| u.is_active && u.role == role)
            .count() as u64)
    }

    async fn active_ids_by_role(&self, role: Role) -> AppResult<Vec<Uuid>> {
        Ok(self
            .state()
            .users
            .iter()
            .filter(|u| u.is_active && u.role == role)
            .map(|u| u.id)
            .collect())
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        Ok(self.state().projects.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<Project>> {
        ProjectRepository::find_by_id(self, id).await
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Project>> {
        Ok(self
            .state()
            .projects
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Project>> {
        Ok(self
            .state()
            .projects
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list(&self, scope: Option<Vec<Uuid>>) -> AppResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .state()
            .projects
            .iter()
            .filter(|p| scope.as_ref().map_or(true, |ids| ids.contains(&p.id)))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn create(&self, project: NewProject) -> AppResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: project.name,
            description: project.description,
            manager_id: project.manager_id,
            created_by: project.created_by,
            start_date: project.start_date,
            end_date: project.end_date,
            status: project.status,
            created_at: now,
            updated_at: now,
        };
        self.state().projects.push(project.clone());
        Ok(project)
    }

    async fn update(&self, project: Project) -> AppResult<Project> {
        let mut state = self.state();
        let slot = state
            .projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or_else(|| AppError::not_found("Project not found"))?;
        *slot = Project {
            updated_at: Utc::now(),
            ..project
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state();
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Ok(false);
        }
        state.members.retain(|m| m.project_id != id);
        let removed: Vec<Uuid> = state
            .activities
            .iter()
            .filter(|a| a.project_id == id)
            .map(|a| a.id)
            .collect();
        state.activities.retain(|a| a.project_id != id);
        for log in state.work_logs.iter_mut() {
            if log.activity_id.map_or(false, |a| removed.contains(&a)) {
                log.activity_id = None;
            }
        }
        Ok(true)
    }

    async fn ids_managed_by(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .state()
            .projects
            .iter()
            .filter(|p| p.manager_id == Some(user_id))
            .map(|p| p.id)
            .collect())
    }

    async fn ids_joined_by(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .state()
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.project_id)
            .collect())
    }

    async fn volunteers(&self, project_id: Uuid) -> AppResult<Vec<ProjectVolunteer>> {
        let state = self.state();
        let mut members: Vec<&Member> = state
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .collect();
        members.sort_by_key(|m| m.assigned_at);
        Ok(members
            .into_iter()
            .filter_map(|m| {
                state.users.iter().find(|u| u.id == m.user_id).map(|u| ProjectVolunteer {
                    user_id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                    assigned_at: m.assigned_at,
                    assigned_by: m.assigned_by,
                })
            })
            .collect())
    }

    async fn is_volunteer(&self, project_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self
            .state()
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id))
    }

    async fn count_volunteers(&self, project_id: Uuid) -> AppResult<u64> {
        Ok(self
            .state()
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .count() as u64)
    }

    async fn add_volunteer(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> AppResult<()> {
        self.state().members.push(Member {
            project_id,
            user_id,
            assigned_at: Utc::now(),
            assigned_by,
        });
        Ok(())
    }

    async fn remove_volunteer(&self, project_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut state = self.state();
        let before = state.members.len();
        state
            .members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(state.members.len() < before)
    }

    async fn volunteer_memberships(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> AppResult<Vec<Membership>> {
        let state = self.state();
        let volunteers: HashSet<Uuid> = state
            .users
            .iter()
            .filter(|u| u.is_active && u.role == Role::Volunteer)
            .map(|u| u.id)
            .collect();
        Ok(state
            .members
            .iter()
            .filter(|m| scope.as_ref().map_or(true, |ids| ids.contains(&m.project_id)))
            .filter(|m| volunteers.contains(&m.user_id))
            .map(|m| Membership {
                project_id: m.project_id,
                user_id: m.user_id,
            })
            .collect())
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Activity>> {
        Ok(self.state().activities.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_title(&self, project_id: Uuid, title: &str) -> AppResult<Option<Activity>> {
        Ok(self
            .state()
            .activities
            .iter()
            .find(|a| a.project_id == project_id && a.title.eq_ignore_ascii_case(title))
            .cloned())
    }

    async fn create(&self, activity: NewActivity) -> AppResult<Activity> {
        let now = Utc::now();
        let activity = Activity {
            id: Uuid::new_v4(),
            title: activity.title,
            description: activity.description,
            date: activity.date,
            project_id: activity.project_id,
            created_by: activity.created_by,
            status: activity.status,
            created_at: now,
            updated_at: now,
        };
        self.state().activities.push(activity.clone());
        Ok(activity)
    }

    async fn update(&self, activity: Activity) -> AppResult<Activity> {
        let mut state = self.state();
        let slot = state
            .activities
            .iter_mut()
            .find(|a| a.id == activity.id)
            .ok_or_else(|| AppError::not_found("Activity not found"))?;
        *slot = Activity {
            updated_at: Utc::now(),
            ..activity
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state();
        let before = state.activities.len();
        state.activities.retain(|a| a.id != id);
        for log in state.work_logs.iter_mut() {
            if log.activity_id == Some(id) {
                log.activity_id = None;
            }
        }
        Ok(state.activities.len() < before)
    }

    async fn list(&self, query: ActivityQuery) -> AppResult<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .state()
            .activities
            .iter()
            .filter(|a| {
                query
                    .project_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&a.project_id))
                    && query.status.map_or(true, |s| a.status == s)
                    && query.from.map_or(true, |from| a.date >= from)
                    && query.to.map_or(true, |to| a.date <= to)
            })
            .cloned()
            .collect();
        activities.sort_by_key(|a| a.date);
        Ok(activities)
    }
}

fn log_matches(log: &WorkLog, query: &WorkLogQuery) -> bool {
    query.user_ids.as_ref().map_or(true, |ids| ids.contains(&log.user_id))
        && query.activity_ids.as_ref().map_or(true, |ids| {
            log.activity_id.map_or(false, |a| ids.contains(&a))
        })
        && query.status.map_or(true, |s| log.status == s)
        && query.week_from.map_or(true, |from| log.week_start >= from)
        && query.week_to.map_or(true, |to| log.week_start < to)
}

#[async_trait]
impl WorkLogRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WorkLog>> {
        Ok(self.work_log(id))
    }

    async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<WorkLog>> {
        Ok(self.work_log(id))
    }

    async fn create(&self, log: NewWorkLog) -> AppResult<WorkLog> {
        let now = Utc::now();
        let log = WorkLog {
            id: Uuid::new_v4(),
            user_id: log.user_id,
            activity_id: log.activity_id,
            week_start: log.week_start,
            hours: log.hours,
            notes: log.notes,
            status: WorkLogStatus::Pending,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state().work_logs.push(log.clone());
        Ok(log)
    }

    async fn update(&self, log: WorkLog) -> AppResult<WorkLog> {
        let mut state = self.state();
        let slot = state
            .work_logs
            .iter_mut()
            .find(|l| l.id == log.id)
            .ok_or_else(|| AppError::not_found("Work log not found"))?;
        *slot = log;
        Ok(slot.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state();
        let before = state.work_logs.len();
        state.work_logs.retain(|l| l.id != id);
        Ok(state.work_logs.len() < before)
    }

    async fn find(&self, query: WorkLogQuery) -> AppResult<Vec<WorkLog>> {
        let mut logs: Vec<WorkLog> = self
            .state()
            .work_logs
            .iter()
            .filter(|l| log_matches(l, &query))
            .cloned()
            .collect();
        logs.sort_by(|a, b| {
            b.week_start
                .cmp(&a.week_start)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(logs)
    }

    async fn count(&self, query: WorkLogQuery) -> AppResult<u64> {
        Ok(self
            .state()
            .work_logs
            .iter()
            .filter(|l| log_matches(l, &query))
            .count() as u64)
    }

    async fn minutes_by_user(&self, user_ids: &[Uuid]) -> AppResult<Vec<(Uuid, i64)>> {
        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for log in self.state().work_logs.iter() {
            if user_ids.contains(&log.user_id) && log.status != WorkLogStatus::Cancelled {
                *totals.entry(log.user_id).or_default() += i64::from(log.hours.minutes());
            }
        }
        Ok(totals.into_iter().collect())
    }
}

#[async_trait]
impl SkillRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Skill>> {
        Ok(self.state().skills.iter().find(|s| s.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Skill>> {
        Ok(self
            .state()
            .skills
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn create(&self, name: String, created_by: Uuid) -> AppResult<Skill> {
        let skill = Skill {
            id: Uuid::new_v4(),
            name,
            created_by,
            created_at: Utc::now(),
        };
        self.state().skills.push(skill.clone());
        Ok(skill)
    }

    async fn rename(&self, id: Uuid, name: String) -> AppResult<Skill> {
        let mut state = self.state();
        let skill = state
            .skills
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::not_found("Skill not found"))?;
        skill.name = name;
        Ok(skill.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state();
        let before = state.skills.len();
        state.skills.retain(|s| s.id != id);
        state.skill_users.retain(|(skill_id, _)| *skill_id != id);
        Ok(state.skills.len() < before)
    }

    async fn list(&self) -> AppResult<Vec<Skill>> {
        let mut skills = self.state().skills.clone();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }

    async fn assignments(&self) -> AppResult<Vec<(Uuid, Uuid)>> {
        Ok(self.state().skill_users.clone())
    }

    async fn assign(&self, skill_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut state = self.state();
        if !state.skill_users.contains(&(skill_id, user_id)) {
            state.skill_users.push((skill_id, user_id));
        }
        Ok(())
    }

    async fn unassign(&self, skill_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut state = self.state();
        let before = state.skill_users.len();
        state.skill_users.retain(|pair| *pair != (skill_id, user_id));
        Ok(state.skill_users.len() < before)
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn create(&self, document: NewDocument) -> AppResult<Document> {
        let document = Document {
            id: Uuid::new_v4(),
            user_id: document.user_id,
            filename: document.filename,
            mimetype: document.mimetype,
            storage_path: document.storage_path,
            doc_type: document.doc_type,
            category_id: document.category_id,
            resource_type_id: document.resource_type_id,
            description: document.description,
            tags: document.tags,
            size_bytes: document.size_bytes,
            downloads: 0,
            created_at: Utc::now(),
        };
        self.state().documents.push(document.clone());
        Ok(document)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        Ok(self.state().documents.iter().find(|d| d.id == id).cloned())
    }

    async fn list(&self, owner: Option<Uuid>) -> AppResult<Vec<Document>> {
        let mut documents: Vec<Document> = self
            .state()
            .documents
            .iter()
            .filter(|d| owner.map_or(true, |o| d.user_id == o))
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    async fn increment_downloads(&self, id: Uuid) -> AppResult<()> {
        if let Some(doc) = self.state().documents.iter_mut().find(|d| d.id == id) {
            doc.downloads += 1;
        }
        Ok(())
    }

    async fn classifications(&self, kind: ClassificationKind) -> AppResult<Vec<Classification>> {
        let mut items = self.state().classifications(kind).clone();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn find_classification(
        &self,
        kind: ClassificationKind,
        id: Uuid,
    ) -> AppResult<Option<Classification>> {
        Ok(self
            .state()
            .classifications(kind)
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_classification_by_name(
        &self,
        kind: ClassificationKind,
        name: &str,
    ) -> AppResult<Option<Classification>> {
        Ok(self
            .state()
            .classifications(kind)
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn create_classification(
        &self,
        kind: ClassificationKind,
        name: String,
    ) -> AppResult<Classification> {
        let item = Classification {
            id: Uuid::new_v4(),
            name,
        };
        self.state().classifications(kind).push(item.clone());
        Ok(item)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn create_many(&self, notifications: Vec<NewNotification>) -> AppResult<u64> {
        let count = notifications.len() as u64;
        let now = Utc::now();
        self.state()
            .notifications
            .extend(notifications.into_iter().map(|n| Notification {
                id: Uuid::new_v4(),
                sender_id: n.sender_id,
                receiver_id: n.receiver_id,
                message: n.message,
                is_read: false,
                created_at: now,
            }));
        Ok(count)
    }

    async fn list_for_receiver(&self, receiver_id: Uuid) -> AppResult<Vec<Notification>> {
        let mut items = self.notifications_for(receiver_id);
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> AppResult<bool> {
        let mut state = self.state();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.receiver_id == receiver_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn store_refresh(
        &self,
        user_id: Uuid,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<RefreshToken> {
        let token = RefreshToken {
            id: Uuid::new_v4(),
            token,
            user_id,
            revoked: false,
            expires_at,
        };
        self.state().refresh_tokens.push(token.clone());
        Ok(token)
    }

    async fn find_refresh(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self
            .state()
            .refresh_tokens
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn revoke_refresh(&self, token: &str) -> AppResult<bool> {
        let mut state = self.state();
        match state
            .refresh_tokens
            .iter_mut()
            .find(|t| t.token == token && !t.revoked)
        {
            Some(t) => {
                t.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut revoked = 0;
        for t in self.state().refresh_tokens.iter_mut() {
            if t.user_id == user_id && !t.revoked {
                t.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn create_reset(
        &self,
        user_id: Uuid,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<PasswordResetToken> {
        let reset = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at,
            used: false,
        };
        self.state().reset_tokens.push(reset.clone());
        Ok(reset)
    }

    async fn find_reset_for_update(&self, token: &str) -> AppResult<Option<PasswordResetToken>> {
        Ok(self
            .state()
            .reset_tokens
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn consume_resets_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut consumed = 0;
        for t in self.state().reset_tokens.iter_mut() {
            if t.user_id == user_id && !t.used {
                t.used = true;
                consumed += 1;
            }
        }
        Ok(consumed)
    }
}

/// A mail that would have been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub kind: &'static str,
    pub token: String,
}

/// Records e-mails instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, to: &str, kind: &'static str, token: &str) -> AppResult<Delivery> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            kind,
            token: token.to_string(),
        });
        Ok(Delivery::Dispatched)
    }
}

#[async_trait]
impl EmailService for RecordingMailer {
    async fn send_welcome(&self, to: &str, _name: &str, token: &str) -> AppResult<Delivery> {
        self.record(to, "welcome", token)
    }

    async fn send_password_reset(&self, to: &str, _name: &str, token: &str) -> AppResult<Delivery> {
        self.record(to, "reset", token)
    }
}

/// Files kept in a map keyed by storage path.
#[derive(Default)]
pub struct MemoryFiles {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFiles {
    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    /// Simulate files lost from disk behind the database's back.
    pub fn clear(&self) {
        self.files.lock().unwrap().clear();
    }
}

#[async_trait]
impl FileStore for MemoryFiles {
    async fn save(&self, owner: Uuid, filename: &str, bytes: Vec<u8>) -> AppResult<String> {
        let path = format!("{}/{}-{}", owner, Uuid::new_v4(), filename);
        self.files.lock().unwrap().insert(path.clone(), bytes);
        Ok(path)
    }

    async fn read(&self, storage_path: &str) -> AppResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(storage_path)
            .cloned()
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    async fn remove(&self, storage_path: &str) -> AppResult<()> {
        self.files.lock().unwrap().remove(storage_path);
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config::new(
        "test-access-secret-with-32-characters!!",
        "test-refresh-secret-with-32-characters!",
    )
}

/// Services over a fresh store, plus handles to inspect side effects.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub files: Arc<MemoryFiles>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let mailer = Arc::new(RecordingMailer::default());
        let files = Arc::new(MemoryFiles::default());
        let services = Services::with_unit_of_work(
            store.clone(),
            test_config(),
            mailer.clone(),
            files.clone(),
        );
        Self {
            store,
            mailer,
            files,
            services,
        }
    }
}
