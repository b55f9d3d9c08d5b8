//! Tests for the notification inbox service.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{MockNotificationRepository, MockUserRepository};
use crate::domain::{Email, ErrorCode, NotificationKind, User, UserDraft, UserName};
use crate::test_support::{FixedClock, instant_retrier};

fn notification(recipient: UserId, read: bool) -> Notification {
    Notification {
        id: NotificationId::random(),
        recipient,
        kind: NotificationKind::NewMessage,
        message: "New message from Ada".to_owned(),
        complaint_id: None,
        read,
        created_at: FixedClock::default().utc(),
    }
}

fn account(role: Role) -> User {
    User::new(UserDraft {
        id: UserId::random(),
        name: UserName::new("Root").expect("valid name"),
        email: Email::new("root@campus.test").expect("valid email"),
        role,
        department: None,
        points: 0,
    })
    .expect("valid user")
}

fn service(
    notifications: MockNotificationRepository,
    users: MockUserRepository,
) -> NotificationService<MockNotificationRepository, MockUserRepository> {
    NotificationService::new(
        Arc::new(notifications),
        Arc::new(users),
        Arc::new(FixedClock::default()),
        instant_retrier(),
    )
}

#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn list_passes_unread_filter(#[case] unread_only: bool) {
    let user = UserId::random();
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_list_for()
        .times(1)
        .withf(move |recipient, flag| *recipient == user && *flag == unread_only)
        .return_once(move |_, _| Ok(vec![notification(user, false)]));

    let listed = service(notifications, MockUserRepository::new())
        .list(&user, unread_only)
        .await
        .expect("list succeeds");

    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn recipient_marks_notification_read() {
    let user = UserId::random();
    let stored = notification(user, false);
    let id = stored.id;
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(stored)));
    notifications
        .expect_mark_read()
        .times(1)
        .withf(move |target| *target == id)
        .return_once(|_| Ok(()));

    let updated = service(notifications, MockUserRepository::new())
        .mark_read(&user, &id)
        .await
        .expect("mark read succeeds");

    assert!(updated.read);
}

#[tokio::test]
async fn marking_read_twice_does_not_write_again() {
    let user = UserId::random();
    let stored = notification(user, true);
    let id = stored.id;
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored)));
    notifications.expect_mark_read().times(0);

    let updated = service(notifications, MockUserRepository::new())
        .mark_read(&user, &id)
        .await
        .expect("idempotent");

    assert!(updated.read);
}

#[tokio::test]
async fn other_users_cannot_mark_read() {
    let stored = notification(UserId::random(), false);
    let id = stored.id;
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(stored)));
    notifications.expect_mark_read().times(0);

    let error = service(notifications, MockUserRepository::new())
        .mark_read(&UserId::random(), &id)
        .await
        .expect_err("forbidden");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn missing_notification_is_not_found() {
    let mut notifications = MockNotificationRepository::new();
    notifications.expect_find_by_id().return_once(|_| Ok(None));

    let error = service(notifications, MockUserRepository::new())
        .mark_read(&UserId::random(), &NotificationId::random())
        .await
        .expect_err("missing");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn admin_sends_notice_to_existing_user() {
    let admin = account(Role::Admin);
    let admin_id = *admin.id();
    let recipient = account(Role::Student);
    let recipient_id = *recipient.id();

    let mut users = MockUserRepository::new();
    users.expect_find_by_id().returning(move |id| {
        if id == admin.id() {
            Ok(Some(admin.clone()))
        } else {
            Ok(Some(recipient.clone()))
        }
    });
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_insert()
        .times(1)
        .withf(move |stored| stored.recipient == recipient_id && !stored.read)
        .return_once(|_| Ok(()));

    let draft = NotificationDraft::try_new(
        recipient_id,
        NotificationKind::ComplaintAccepted,
        "Maintenance window tonight",
        None,
    )
    .expect("valid draft");
    let sent = service(notifications, users)
        .send(&admin_id, draft)
        .await
        .expect("send succeeds");

    assert_eq!(sent.message, "Maintenance window tonight");
    assert_eq!(sent.created_at, FixedClock::default().utc());
}

#[tokio::test]
async fn students_cannot_send_notices() {
    let student = account(Role::Student);
    let student_id = *student.id();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(student)));
    let mut notifications = MockNotificationRepository::new();
    notifications.expect_insert().times(0);

    let draft = NotificationDraft::try_new(
        UserId::random(),
        NotificationKind::NewMessage,
        "hello",
        None,
    )
    .expect("valid draft");
    let error = service(notifications, users)
        .send(&student_id, draft)
        .await
        .expect_err("forbidden");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn connection_failures_map_to_service_unavailable() {
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_mark_all_read()
        .times(3)
        .returning(|_| Err(NotificationRepositoryError::connection("refused")));

    let error = service(notifications, MockUserRepository::new())
        .mark_all_read(&UserId::random())
        .await
        .expect_err("unavailable");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}
