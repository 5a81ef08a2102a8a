//! Accounts, skills, documents and notifications over the in-memory unit of work.

mod common;

use uuid::Uuid;

use common::Harness;
use voluntalia_api::domain::{
    Actor, ClassificationKind, CreateUser, Role, SendNotification, UploadMetadata, UploadedFile,
    User,
};
use voluntalia_api::errors::AppError;
use voluntalia_api::services::ServiceContainer;

fn actor(user: &User) -> Actor {
    Actor::new(user.id, user.role)
}

fn pdf(name: &str) -> UploadedFile {
    UploadedFile {
        filename: name.to_string(),
        mimetype: "application/pdf".to_string(),
        bytes: b"%PDF-1.7 consent".to_vec(),
    }
}

#[tokio::test]
async fn invited_user_sets_a_password_through_the_welcome_link() {
    let harness = Harness::new();
    let coordinator = harness.store.seed_user("Carla Coordinator", Role::Coordinator);

    let user = harness
        .services
        .users()
        .create(
            actor(&coordinator),
            CreateUser {
                name: "Lea Legal".into(),
                email: "lea@example.org".into(),
                role: Role::Legal,
                phone: None,
                city: Some("Lyon".into()),
                country: None,
            },
        )
        .await
        .unwrap();

    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, "welcome");
    assert_eq!(sent[0].to, "lea@example.org");

    let login = harness
        .services
        .auth()
        .login("lea@example.org".into(), "anything-goes".into())
        .await;
    assert!(matches!(login, Err(AppError::InvalidCredentials)));

    harness
        .services
        .auth()
        .reset_password(sent[0].token.clone(), "a-brand-new-secret".into())
        .await
        .unwrap();

    let session = harness
        .services
        .auth()
        .login("lea@example.org".into(), "a-brand-new-secret".into())
        .await
        .unwrap();
    assert_eq!(session.user.id, user.id);

    let reused = harness
        .services
        .auth()
        .reset_password(sent[0].token.clone(), "another-secret-1".into())
        .await;
    assert!(matches!(reused, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn forgot_password_is_silent_for_unknown_addresses() {
    let harness = Harness::new();
    harness
        .services
        .auth()
        .forgot_password("ghost@example.org".into())
        .await
        .unwrap();
    assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn a_reset_link_works_once_even_when_used_concurrently() {
    let harness = Harness::new();
    let user = harness
        .store
        .seed_account("Vera Volunteer", Role::Volunteer, "volunteer-secret");
    let auth = harness.services.auth();

    auth.forgot_password(user.email.clone()).await.unwrap();
    let sent = harness.mailer.sent();
    assert_eq!(sent[0].kind, "reset");
    let token = sent[0].token.clone();

    let (first, second) = tokio::join!(
        auth.reset_password(token.clone(), "first-new-secret".into()),
        auth.reset_password(token.clone(), "second-new-secret".into()),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::BadRequest(_)))));
}

#[tokio::test]
async fn refresh_tokens_stop_working_after_logout() {
    let harness = Harness::new();
    let user = harness
        .store
        .seed_account("Vera Volunteer", Role::Volunteer, "volunteer-secret");
    let auth = harness.services.auth();

    let session = auth
        .login(user.email.clone(), "volunteer-secret".into())
        .await
        .unwrap();
    let refreshed = auth.refresh(session.refresh_token.clone()).await.unwrap();
    let claims = auth.verify_token(&refreshed.access_token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.role, Role::Volunteer);

    auth.logout(session.refresh_token.clone()).await.unwrap();
    let after = auth.refresh(session.refresh_token).await;
    assert!(matches!(after, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn skills_are_managed_by_coordinators_and_listed_publicly() {
    let harness = Harness::new();
    let coordinator = harness.store.seed_user("Carla Coordinator", Role::Coordinator);
    let volunteer = harness.store.seed_user("Vera Volunteer", Role::Volunteer);
    let skills = harness.services.skills();

    let denied = skills.create(actor(&volunteer), "First aid".into()).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let first_aid = skills
        .create(actor(&coordinator), "First aid".into())
        .await
        .unwrap();
    let duplicate = skills.create(actor(&coordinator), "first aid".into()).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    skills
        .assign(actor(&coordinator), first_aid.id, volunteer.id)
        .await
        .unwrap();
    skills
        .assign(actor(&coordinator), first_aid.id, volunteer.id)
        .await
        .unwrap();

    let listed = skills.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].volunteers.len(), 1);
    assert_eq!(listed[0].volunteers[0].id, volunteer.id);

    skills
        .unassign(actor(&coordinator), first_aid.id, volunteer.id)
        .await
        .unwrap();
    let again = skills
        .unassign(actor(&coordinator), first_aid.id, volunteer.id)
        .await;
    assert!(matches!(again, Err(AppError::NotFound(_))));

    skills.delete(actor(&coordinator), first_aid.id).await.unwrap();
    let gone = skills.delete(actor(&coordinator), first_aid.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn documents_are_private_except_to_coordinators_and_legal() {
    let harness = Harness::new();
    let owner = harness.store.seed_user("Vera Volunteer", Role::Volunteer);
    let neighbour = harness.store.seed_user("Sam Volunteer", Role::Volunteer);
    let legal = harness.store.seed_user("Lea Legal", Role::Legal);
    let documents = harness.services.documents();

    let document = documents
        .upload(
            actor(&owner),
            pdf("consent.pdf"),
            UploadMetadata {
                doc_type: Some("consent".into()),
                tags: vec!["2025".into()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(document.doc_type, "CONSENT");
    assert_eq!(document.downloads, 0);

    let peek = documents.download(actor(&neighbour), document.id).await;
    assert!(matches!(peek, Err(AppError::Forbidden(_))));
    assert!(documents.list(actor(&neighbour)).await.unwrap().is_empty());

    let (meta, bytes) = documents.download(actor(&legal), document.id).await.unwrap();
    assert_eq!(meta.filename, "consent.pdf");
    assert_eq!(bytes, b"%PDF-1.7 consent".to_vec());

    documents.download(actor(&owner), document.id).await.unwrap();
    let listed = documents.list(actor(&legal)).await.unwrap();
    assert_eq!(listed[0].downloads, 2);
}

#[tokio::test]
async fn missing_files_are_not_counted_as_downloads() {
    let harness = Harness::new();
    let owner = harness.store.seed_user("Vera Volunteer", Role::Volunteer);
    let documents = harness.services.documents();

    let document = documents
        .upload(actor(&owner), pdf("consent.pdf"), UploadMetadata::default())
        .await
        .unwrap();
    harness.files.clear();

    let missing = documents.download(actor(&owner), document.id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    let listed = documents.list(actor(&owner)).await.unwrap();
    assert_eq!(listed[0].downloads, 0);
}

#[tokio::test]
async fn rejected_uploads_do_not_leave_files_behind() {
    let harness = Harness::new();
    let owner = harness.store.seed_user("Vera Volunteer", Role::Volunteer);

    let result = harness
        .services
        .documents()
        .upload(
            actor(&owner),
            pdf("consent.pdf"),
            UploadMetadata {
                category_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(harness.files.len(), 0);
    assert_eq!(harness.store.document_count(), 0);
}

#[tokio::test]
async fn classifications_reject_duplicates() {
    let harness = Harness::new();
    let legal = harness.store.seed_user("Lea Legal", Role::Legal);
    let volunteer = harness.store.seed_user("Vera Volunteer", Role::Volunteer);
    let documents = harness.services.documents();

    documents
        .create_classification(actor(&legal), ClassificationKind::Category, "Consent".into())
        .await
        .unwrap();
    let duplicate = documents
        .create_classification(actor(&legal), ClassificationKind::Category, "consent".into())
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(msg)) if msg == "Category already exists"));

    // Same name is fine under the other kind.
    documents
        .create_classification(actor(&legal), ClassificationKind::ResourceType, "Consent".into())
        .await
        .unwrap();

    let denied = documents
        .create_classification(actor(&volunteer), ClassificationKind::Category, "Misc".into())
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn broadcasts_reach_active_volunteers_only() {
    let harness = Harness::new();
    let coordinator = harness.store.seed_user("Carla Coordinator", Role::Coordinator);
    let vera = harness.store.seed_user("Vera Volunteer", Role::Volunteer);
    let sam = harness.store.seed_user("Sam Volunteer", Role::Volunteer);
    let legal = harness.store.seed_user("Lea Legal", Role::Legal);
    let notifications = harness.services.notifications();

    let outcome = notifications
        .send(
            actor(&coordinator),
            SendNotification {
                message: "Shift starts at 9:00 tomorrow".into(),
                receiver_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.sent, 2);
    assert!(harness.store.notifications_for(legal.id).is_empty());

    let denied = notifications
        .send(
            actor(&vera),
            SendNotification {
                message: "Hello everyone".into(),
                receiver_id: None,
            },
        )
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let inbox = notifications.list(actor(&sam)).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].sender_name.as_deref(), Some("Carla Coordinator"));
    assert!(!inbox[0].is_read);

    notifications.mark_read(actor(&sam), inbox[0].id).await.unwrap();
    assert!(notifications.list(actor(&sam)).await.unwrap()[0].is_read);

    let foreign = notifications.mark_read(actor(&vera), inbox[0].id).await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));
}
