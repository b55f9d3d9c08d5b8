//! Tests for the complaint service.

use std::sync::Arc;

use chrono::NaiveDate;
use rstest::rstest;

use super::*;
use crate::domain::ports::{MockComplaintRepository, MockUserRepository};
use crate::domain::{
    Category, Department, Difficulty, Email, ErrorCode, NotificationKind, Role, User, UserDraft,
    UserName,
};
use crate::test_support::{FixedClock, instant_retrier};

fn user(role: Role, department: Option<&str>) -> User {
    User::new(UserDraft {
        id: UserId::random(),
        name: UserName::new("Grace").expect("valid name"),
        email: Email::new("grace@campus.test").expect("valid email"),
        role,
        department: department.map(|label| Department::new(label).expect("valid department")),
        points: 0,
    })
    .expect("valid user")
}

fn open_complaint(raised_by: UserId, category: &str, emergency: bool, due_day: u32) -> Complaint {
    Complaint::open(
        ComplaintId::random(),
        NewComplaint {
            title: "Leaking pipe".to_owned(),
            description: "Water under the sink".to_owned(),
            category: Category::new(category).expect("valid category"),
            location: None,
            difficulty: Difficulty::Hard,
            emergency,
            fix_till_date: NaiveDate::from_ymd_opt(2026, 1, due_day).expect("valid date"),
        },
        raised_by,
        FixedClock::default().utc(),
    )
}

fn users_returning(found: User) -> MockUserRepository {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));
    users
}

fn service(
    complaints: MockComplaintRepository,
    users: MockUserRepository,
) -> ComplaintService<MockComplaintRepository, MockUserRepository> {
    ComplaintService::new(
        Arc::new(complaints),
        Arc::new(users),
        Arc::new(FixedClock::default()),
        instant_retrier(),
    )
}

fn submission() -> ComplaintSubmission {
    ComplaintSubmission {
        title: Some("Leaking pipe".to_owned()),
        description: Some("Water under the sink".to_owned()),
        category: Some("Plumbing".to_owned()),
        location: None,
        difficulty: Some("medium".to_owned()),
        emergency: true,
        fix_till_date: NaiveDate::from_ymd_opt(2026, 1, 9),
    }
}

#[tokio::test]
async fn create_opens_complaint_for_student() {
    let raiser = user(Role::Student, None);
    let raiser_id = *raiser.id();
    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_insert()
        .times(1)
        .withf(|complaint| complaint.status() == ComplaintStatus::Open)
        .return_once(|_| Ok(()));

    let complaint = service(complaints, users_returning(raiser))
        .create(&raiser_id, submission())
        .await
        .expect("create succeeds");

    assert_eq!(complaint.raised_by(), &raiser_id);
    assert_eq!(complaint.category().as_ref(), "plumbing");
    assert!(complaint.volunteer().is_none());
    assert_eq!(complaint.created_at(), FixedClock::default().utc());
}

#[rstest]
#[case(Role::Technical, Some("plumbing"))]
#[case(Role::Admin, None)]
#[tokio::test]
async fn create_is_forbidden_for_non_students(
    #[case] role: Role,
    #[case] department: Option<&str>,
) {
    let actor = user(role, department);
    let actor_id = *actor.id();
    let mut complaints = MockComplaintRepository::new();
    complaints.expect_insert().times(0);

    let error = service(complaints, users_returning(actor))
        .create(&actor_id, submission())
        .await
        .expect_err("forbidden");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn create_reports_missing_field() {
    let raiser = user(Role::Student, None);
    let raiser_id = *raiser.id();
    let mut complaints = MockComplaintRepository::new();
    complaints.expect_insert().times(0);

    let error = service(complaints, users_returning(raiser))
        .create(
            &raiser_id,
            ComplaintSubmission {
                title: Some("   ".to_owned()),
                ..submission()
            },
        )
        .await
        .expect_err("blank title");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details().and_then(|details| details.get("field")).cloned(),
        Some(serde_json::json!("title"))
    );
}

#[tokio::test]
async fn resolve_commits_award_and_notification() {
    let volunteer = user(Role::Student, None);
    let volunteer_id = *volunteer.id();
    let raiser = UserId::random();
    let open = open_complaint(raiser, "plumbing", false, 9);
    let in_progress = plan_transition(
        &open,
        &Actor::from(&volunteer),
        Transition::Accept,
        FixedClock::default().utc(),
    )
    .expect("accept plan")
    .complaint;
    let complaint_id = in_progress.id();

    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(in_progress)));
    complaints
        .expect_commit_transition()
        .times(1)
        .withf(move |plan, notification| {
            plan.expected_status == ComplaintStatus::InProgress
                && plan.expected_volunteer == Some(volunteer_id)
                && plan.award.map(|award| (award.user_id, award.points))
                    == Some((volunteer_id, 50))
                && notification.recipient == raiser
                && notification.kind == NotificationKind::ComplaintResolved
                && !notification.read
        })
        .return_once(|_, _| Ok(()));

    let resolved = service(complaints, users_returning(volunteer))
        .transition(&volunteer_id, &complaint_id, Transition::Resolve)
        .await
        .expect("resolve succeeds");

    assert_eq!(resolved.status(), ComplaintStatus::Resolved);
    assert_eq!(resolved.resolved_at(), Some(FixedClock::default().utc()));
}

#[tokio::test]
async fn lost_race_surfaces_as_conflict() {
    let volunteer = user(Role::Student, None);
    let volunteer_id = *volunteer.id();
    let open = open_complaint(UserId::random(), "plumbing", false, 9);
    let complaint_id = open.id();

    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(open)));
    complaints
        .expect_commit_transition()
        .times(1)
        .return_once(move |_, _| Err(ComplaintRepositoryError::conflict(complaint_id.to_string())));

    let error = service(complaints, users_returning(volunteer))
        .transition(&volunteer_id, &complaint_id, Transition::Accept)
        .await
        .expect_err("conflict");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

fn accepted_by(volunteer: &User, open: &Complaint) -> Complaint {
    plan_transition(
        open,
        &Actor::from(volunteer),
        Transition::Accept,
        FixedClock::default().utc(),
    )
    .expect("accept plan")
    .complaint
}

#[tokio::test]
async fn retried_commit_that_already_landed_reports_success() {
    let volunteer = user(Role::Student, None);
    let volunteer_id = *volunteer.id();
    let open = open_complaint(UserId::random(), "plumbing", false, 9);
    let complaint_id = open.id();
    let landed = accepted_by(&volunteer, &open);

    let mut complaints = MockComplaintRepository::new();
    let mut reads = vec![open, landed];
    complaints
        .expect_find_by_id()
        .times(2)
        .returning(move |_| Ok(Some(reads.remove(0))));
    let mut outcomes = vec![
        Err(ComplaintRepositoryError::connection("connection closed during commit")),
        Err(ComplaintRepositoryError::conflict(complaint_id.to_string())),
    ];
    complaints
        .expect_commit_transition()
        .times(2)
        .returning(move |_, _| outcomes.remove(0));

    let accepted = service(complaints, users_returning(volunteer))
        .transition(&volunteer_id, &complaint_id, Transition::Accept)
        .await
        .expect("earlier attempt committed");

    assert_eq!(accepted.status(), ComplaintStatus::InProgress);
    assert_eq!(accepted.volunteer_id(), Some(&volunteer_id));
}

#[tokio::test]
async fn retried_commit_beaten_by_another_volunteer_is_a_conflict() {
    let volunteer = user(Role::Student, None);
    let volunteer_id = *volunteer.id();
    let rival = user(Role::Student, None);
    let open = open_complaint(UserId::random(), "plumbing", false, 9);
    let complaint_id = open.id();
    let taken = accepted_by(&rival, &open);

    let mut complaints = MockComplaintRepository::new();
    let mut reads = vec![open, taken];
    complaints
        .expect_find_by_id()
        .times(2)
        .returning(move |_| Ok(Some(reads.remove(0))));
    let mut outcomes = vec![
        Err(ComplaintRepositoryError::connection("connection closed during commit")),
        Err(ComplaintRepositoryError::conflict(complaint_id.to_string())),
    ];
    complaints
        .expect_commit_transition()
        .times(2)
        .returning(move |_, _| outcomes.remove(0));

    let error = service(complaints, users_returning(volunteer))
        .transition(&volunteer_id, &complaint_id, Transition::Accept)
        .await
        .expect_err("rival won");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[case::wrong_department(Role::Technical, Some("electrical"), ErrorCode::Forbidden)]
#[case::admin(Role::Admin, None, ErrorCode::Forbidden)]
#[tokio::test]
async fn refused_accept_never_commits(
    #[case] role: Role,
    #[case] department: Option<&str>,
    #[case] expected: ErrorCode,
) {
    let actor = user(role, department);
    let actor_id = *actor.id();
    let open = open_complaint(UserId::random(), "plumbing", false, 9);
    let complaint_id = open.id();

    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(open)));
    complaints.expect_commit_transition().times(0);

    let error = service(complaints, users_returning(actor))
        .transition(&actor_id, &complaint_id, Transition::Accept)
        .await
        .expect_err("refused");

    assert_eq!(error.code(), expected);
}

#[tokio::test]
async fn resolving_open_complaint_is_a_conflict() {
    let actor = user(Role::Student, None);
    let actor_id = *actor.id();
    let open = open_complaint(UserId::random(), "plumbing", false, 9);
    let complaint_id = open.id();

    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(open)));
    complaints.expect_commit_transition().times(0);

    let error = service(complaints, users_returning(actor))
        .transition(&actor_id, &complaint_id, Transition::Resolve)
        .await
        .expect_err("not in progress");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn transition_on_missing_complaint_is_not_found() {
    let actor = user(Role::Student, None);
    let actor_id = *actor.id();
    let mut complaints = MockComplaintRepository::new();
    complaints.expect_find_by_id().return_once(|_| Ok(None));

    let error = service(complaints, users_returning(actor))
        .transition(&actor_id, &ComplaintId::random(), Transition::Accept)
        .await
        .expect_err("missing");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn unknown_session_user_is_unauthorized() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));
    let mut complaints = MockComplaintRepository::new();
    complaints.expect_find_by_id().times(0);

    let error = service(complaints, users)
        .transition(&UserId::random(), &ComplaintId::random(), Transition::Accept)
        .await
        .expect_err("unknown user");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn edit_by_raiser_updates_open_complaint() {
    let raiser = user(Role::Student, None);
    let raiser_id = *raiser.id();
    let open = open_complaint(raiser_id, "plumbing", false, 9);
    let complaint_id = open.id();

    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(open)));
    complaints
        .expect_update_details()
        .times(1)
        .withf(|complaint, expected| {
            complaint.title() == "Burst pipe" && *expected == ComplaintStatus::Open
        })
        .return_once(|_, _| Ok(()));

    let updated = service(complaints, users_returning(raiser))
        .edit(
            &raiser_id,
            &complaint_id,
            ComplaintEdit {
                title: Some("Burst pipe".to_owned()),
                ..ComplaintEdit::default()
            },
        )
        .await
        .expect("edit succeeds");

    assert_eq!(updated.title(), "Burst pipe");
}

#[tokio::test]
async fn edit_by_someone_else_is_forbidden() {
    let other = user(Role::Student, None);
    let other_id = *other.id();
    let open = open_complaint(UserId::random(), "plumbing", false, 9);
    let complaint_id = open.id();

    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(open)));
    complaints.expect_update_details().times(0);

    let error = service(complaints, users_returning(other))
        .edit(
            &other_id,
            &complaint_id,
            ComplaintEdit {
                emergency: Some(true),
                ..ComplaintEdit::default()
            },
        )
        .await
        .expect_err("not raiser");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn empty_edit_is_invalid() {
    let error = service(MockComplaintRepository::new(), MockUserRepository::new())
        .edit(&UserId::random(), &ComplaintId::random(), ComplaintEdit::default())
        .await
        .expect_err("empty edit");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(Role::Student, None)]
#[case(Role::Technical, Some("plumbing"))]
#[tokio::test]
async fn delete_requires_admin(#[case] role: Role, #[case] department: Option<&str>) {
    let actor = user(role, department);
    let actor_id = *actor.id();
    let mut complaints = MockComplaintRepository::new();
    complaints.expect_delete().times(0);

    let error = service(complaints, users_returning(actor))
        .delete(&actor_id, &ComplaintId::random())
        .await
        .expect_err("forbidden");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(true, None)]
#[case(false, Some(ErrorCode::NotFound))]
#[tokio::test]
async fn admin_delete_reports_missing_rows(
    #[case] existed: bool,
    #[case] expected: Option<ErrorCode>,
) {
    let admin = user(Role::Admin, None);
    let admin_id = *admin.id();
    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_delete()
        .times(1)
        .return_once(move |_| Ok(existed));

    let outcome = service(complaints, users_returning(admin))
        .delete(&admin_id, &ComplaintId::random())
        .await;

    assert_eq!(outcome.err().map(|err| err.code()), expected);
}

#[tokio::test]
async fn queue_keeps_acceptable_complaints_in_volunteer_order() {
    let tech = user(Role::Technical, Some("plumbing"));
    let tech_id = *tech.id();
    let later = open_complaint(UserId::random(), "plumbing", false, 20);
    let sooner = open_complaint(UserId::random(), "plumbing", false, 5);
    let urgent = open_complaint(UserId::random(), "other", true, 25);
    let elsewhere = open_complaint(UserId::random(), "electrical", true, 1);
    let expected = vec![urgent.id(), sooner.id(), later.id()];

    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_list()
        .times(1)
        .withf(|filter| filter.status == Some(ComplaintStatus::Open))
        .return_once(move |_| Ok(vec![later, elsewhere, sooner, urgent]));

    let queue = service(complaints, users_returning(tech))
        .queue(&tech_id)
        .await
        .expect("queue loads");

    let ids: Vec<ComplaintId> = queue.iter().map(Complaint::id).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn transient_commit_failures_are_retried() {
    let volunteer = user(Role::Student, None);
    let volunteer_id = *volunteer.id();
    let open = open_complaint(UserId::random(), "plumbing", false, 9);
    let complaint_id = open.id();

    let mut complaints = MockComplaintRepository::new();
    complaints
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(open)));
    let mut seq = mockall::Sequence::new();
    complaints
        .expect_commit_transition()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Err(ComplaintRepositoryError::connection("reset by peer")));
    complaints
        .expect_commit_transition()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _| Ok(()));

    let accepted = service(complaints, users_returning(volunteer))
        .transition(&volunteer_id, &complaint_id, Transition::Accept)
        .await
        .expect("retry succeeds");

    assert_eq!(accepted.volunteer_id(), Some(&volunteer_id));
}
