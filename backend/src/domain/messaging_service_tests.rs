//! Tests for the messaging service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{MockMessageRepository, MockUserRepository};
use crate::domain::{ComplaintId, Email, ErrorCode, NotificationKind, Role, User, UserDraft, UserName};
use crate::test_support::{FixedClock, instant_retrier};

fn student(name: &str) -> User {
    User::new(UserDraft {
        id: UserId::random(),
        name: UserName::new(name).expect("valid name"),
        email: Email::new(format!("{}@campus.test", name.to_lowercase())).expect("valid email"),
        role: Role::Student,
        department: None,
        points: 0,
    })
    .expect("valid user")
}

fn service(
    messages: MockMessageRepository,
    users: MockUserRepository,
) -> MessagingService<MockMessageRepository, MockUserRepository> {
    MessagingService::new(
        Arc::new(messages),
        Arc::new(users),
        Arc::new(FixedClock::default()),
        instant_retrier(),
    )
}

fn users_knowing(known: Vec<User>) -> MockUserRepository {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |id| Ok(known.iter().find(|user| user.id() == id).cloned()));
    users
}

#[tokio::test]
async fn send_stores_message_with_single_notification() {
    let ada = student("Ada");
    let bob = student("Bob");
    let (ada_id, bob_id) = (*ada.id(), *bob.id());

    let mut messages = MockMessageRepository::new();
    messages
        .expect_send()
        .times(1)
        .withf(move |message, notification| {
            message.sender == ada_id
                && message.receiver == bob_id
                && !message.read
                && notification.recipient == bob_id
                && notification.kind == NotificationKind::NewMessage
                && notification.message == "New message from Ada"
        })
        .return_once(|_, _| Ok(()));

    let sent = service(messages, users_knowing(vec![ada, bob]))
        .send(
            &ada_id,
            SendMessageRequest {
                receiver: bob_id,
                complaint_id: None,
                content: "Is the tap fixed?".to_owned(),
            },
        )
        .await
        .expect("send succeeds");

    assert_eq!(sent.content, "Is the tap fixed?");
    assert_eq!(sent.created_at, FixedClock::default().utc());
}

#[tokio::test]
async fn send_to_unknown_receiver_is_not_found() {
    let ada = student("Ada");
    let ada_id = *ada.id();
    let mut messages = MockMessageRepository::new();
    messages.expect_send().times(0);

    let error = service(messages, users_knowing(vec![ada]))
        .send(
            &ada_id,
            SendMessageRequest {
                receiver: UserId::random(),
                complaint_id: None,
                content: "hello".to_owned(),
            },
        )
        .await
        .expect_err("unknown receiver");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn blank_content_is_rejected_before_lookup() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().times(0);

    let error = service(MockMessageRepository::new(), users)
        .send(
            &UserId::random(),
            SendMessageRequest {
                receiver: UserId::random(),
                complaint_id: None,
                content: "   ".to_owned(),
            },
        )
        .await
        .expect_err("blank");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn mark_read_targets_messages_from_other_user() {
    let reader = UserId::random();
    let other = UserId::random();
    let mut messages = MockMessageRepository::new();
    messages
        .expect_mark_conversation_read()
        .times(1)
        .withf(move |r, s| *r == reader && *s == other)
        .return_once(|_, _| Ok(2));

    let changed = service(messages, MockUserRepository::new())
        .mark_read(&reader, &other)
        .await
        .expect("mark read succeeds");

    assert_eq!(changed, 2);
}

#[tokio::test]
async fn query_failures_map_to_internal() {
    let mut messages = MockMessageRepository::new();
    messages
        .expect_conversation()
        .times(1)
        .return_once(|_, _| Err(MessageRepositoryError::query("syntax error")));

    let error = service(messages, MockUserRepository::new())
        .conversation(&UserId::random(), &UserId::random())
        .await
        .expect_err("query failure");

    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[tokio::test]
async fn send_about_deleted_complaint_is_not_found() {
    let ada = student("Ada");
    let bob = student("Bob");
    let (ada_id, bob_id) = (*ada.id(), *bob.id());
    let mut messages = MockMessageRepository::new();
    messages.expect_send().times(1).return_once(|_, _| {
        Err(MessageRepositoryError::missing_reference(
            "complaint no longer exists",
        ))
    });

    let error = service(messages, users_knowing(vec![ada, bob]))
        .send(
            &ada_id,
            SendMessageRequest {
                receiver: bob_id,
                complaint_id: Some(ComplaintId::random()),
                content: "Is this still open?".to_owned(),
            },
        )
        .await
        .expect_err("dangling complaint");

    assert_eq!(error.code(), ErrorCode::NotFound);
}
