//! Tests for complaint values, invariants and queue ordering.

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).expect("valid date")
}

fn created(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 8, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn complaint(title: &str, emergency: bool, due: NaiveDate, created_at: DateTime<Utc>) -> Complaint {
    Complaint::open(
        ComplaintId::random(),
        NewComplaint {
            title: title.to_owned(),
            description: "details".to_owned(),
            category: Category::new("other").expect("valid category"),
            location: None,
            difficulty: Difficulty::Easy,
            emergency,
            fix_till_date: due,
        },
        UserId::random(),
        created_at,
    )
}

fn base_submission() -> ComplaintSubmission {
    ComplaintSubmission {
        title: Some("  Broken window ".to_owned()),
        description: Some("Glass cracked in room 12".to_owned()),
        category: Some("Maintenance".to_owned()),
        location: Some("   ".to_owned()),
        difficulty: Some("Hard".to_owned()),
        emergency: true,
        fix_till_date: Some(date(2, 1)),
    }
}

#[fixture]
fn submission() -> ComplaintSubmission {
    base_submission()
}

#[rstest]
#[case("easy", 10)]
#[case("medium", 25)]
#[case("hard", 50)]
#[case("extreme", 10)]
#[case("", 10)]
fn points_for_uses_fixed_table(#[case] label: &str, #[case] expected: u32) {
    assert_eq!(points_for(label), expected);
}

#[rstest]
fn volunteer_queue_orders_emergencies_then_due_date() {
    let a = complaint("A", true, date(1, 20), created(0));
    let b = complaint("B", false, date(1, 5), created(1));
    let c = complaint("C", true, date(1, 10), created(2));
    let mut complaints = vec![a, b, c];

    sort_for_volunteers(&mut complaints);

    let titles: Vec<&str> = complaints.iter().map(Complaint::title).collect();
    assert_eq!(titles, vec!["C", "A", "B"]);
}

#[rstest]
fn volunteer_queue_breaks_ties_by_creation_time() {
    let later = complaint("later", false, date(1, 5), created(9));
    let earlier = complaint("earlier", false, date(1, 5), created(3));
    let mut complaints = vec![later, earlier];

    sort_for_volunteers(&mut complaints);

    assert_eq!(complaints.first().map(Complaint::title), Some("earlier"));
}

#[rstest]
fn submission_is_normalised(submission: ComplaintSubmission) {
    let validated = NewComplaint::try_from(submission).expect("valid submission");
    assert_eq!(validated.title, "Broken window");
    assert_eq!(validated.category.as_ref(), "maintenance");
    assert_eq!(validated.location, None);
    assert_eq!(validated.difficulty, Difficulty::Hard);
}

#[rstest]
#[case::title(ComplaintSubmission { title: None, ..base_submission() }, "title")]
#[case::description(ComplaintSubmission { description: Some(" ".to_owned()), ..base_submission() }, "description")]
#[case::category(ComplaintSubmission { category: None, ..base_submission() }, "category")]
#[case::difficulty(ComplaintSubmission { difficulty: None, ..base_submission() }, "difficulty")]
#[case::fix_till_date(ComplaintSubmission { fix_till_date: None, ..base_submission() }, "fixTillDate")]
fn submission_requires_fields(#[case] raw: ComplaintSubmission, #[case] field: &'static str) {
    assert_eq!(
        NewComplaint::try_from(raw),
        Err(ComplaintValidationError::MissingField { field })
    );
}

#[rstest]
fn submission_rejects_unknown_difficulty(submission: ComplaintSubmission) {
    let raw = ComplaintSubmission {
        difficulty: Some("legendary".to_owned()),
        ..submission
    };
    assert_eq!(
        NewComplaint::try_from(raw),
        Err(ComplaintValidationError::UnknownDifficulty(
            "legendary".to_owned()
        ))
    );
}

#[rstest]
fn submission_rejects_overlong_title(submission: ComplaintSubmission) {
    let raw = ComplaintSubmission {
        title: Some("t".repeat(TITLE_MAX + 1)),
        ..submission
    };
    assert_eq!(
        NewComplaint::try_from(raw),
        Err(ComplaintValidationError::FieldTooLong {
            field: "title",
            max: TITLE_MAX
        })
    );
}

#[rstest]
fn new_rejects_volunteer_on_open_complaint() {
    let mut draft = complaint("x", false, date(1, 1), created(0)).into_draft();
    draft.volunteer = Some(Volunteer {
        id: UserId::random(),
        name: "Grace".to_owned(),
    });
    assert_eq!(
        Complaint::new(draft),
        Err(ComplaintValidationError::VolunteerMismatch {
            status: ComplaintStatus::Open
        })
    );
}

#[rstest]
#[case(ComplaintStatus::InProgress, true, false)]
#[case(ComplaintStatus::Resolved, true, true)]
#[case(ComplaintStatus::Resolved, false, true)]
#[case(ComplaintStatus::Resolved, true, false)]
fn new_enforces_status_invariants(
    #[case] status: ComplaintStatus,
    #[case] with_volunteer: bool,
    #[case] with_resolved_at: bool,
) {
    let mut draft = complaint("x", false, date(1, 1), created(0)).into_draft();
    draft.status = status;
    draft.volunteer = with_volunteer.then(|| Volunteer {
        id: UserId::random(),
        name: "Grace".to_owned(),
    });
    draft.resolved_at = with_resolved_at.then(|| created(5));
    let valid = with_volunteer == status.expects_volunteer()
        && with_resolved_at == (status == ComplaintStatus::Resolved);
    assert_eq!(Complaint::new(draft).is_ok(), valid);
}

#[rstest]
#[case("open", ComplaintStatus::Open)]
#[case("in-progress", ComplaintStatus::InProgress)]
#[case("resolved", ComplaintStatus::Resolved)]
#[case("closed", ComplaintStatus::Closed)]
fn status_labels_parse(#[case] raw: &str, #[case] expected: ComplaintStatus) {
    assert_eq!(raw.parse::<ComplaintStatus>(), Ok(expected));
    let json = serde_json::to_value(expected).expect("serialise status");
    assert_eq!(json, serde_json::Value::String(raw.to_owned()));
}

#[rstest]
fn edit_rejects_empty_change() {
    assert_eq!(
        ComplaintEdit::default().validate(),
        Err(ComplaintValidationError::EmptyEdit)
    );
}

#[rstest]
fn edit_applies_only_given_fields() {
    let original = complaint("Old", false, date(1, 1), created(0));
    let edit = ComplaintEdit {
        title: Some(" New title ".to_owned()),
        location: Some(Some("Library".to_owned())),
        ..ComplaintEdit::default()
    }
    .validate()
    .expect("valid edit");

    let edited = original.clone().with_edit(edit);

    assert_eq!(edited.title(), "New title");
    assert_eq!(edited.location(), Some("Library"));
    assert_eq!(edited.description(), original.description());
    assert_eq!(edited.status(), ComplaintStatus::Open);
}

fn assigned_to(volunteer: UserId, name: &str) -> Complaint {
    let mut draft = complaint("Broken lamp", false, date(1, 1), created(0)).into_draft();
    draft.status = ComplaintStatus::InProgress;
    draft.volunteer = Some(Volunteer {
        id: volunteer,
        name: name.to_owned(),
    });
    Complaint::new(draft).expect("valid in-progress complaint")
}

#[rstest]
fn renamed_volunteer_is_refreshed() {
    let volunteer = UserId::random();
    let renamed = assigned_to(volunteer, "Tess").with_volunteer_name(&volunteer, "Tess Fixit");

    assert_eq!(
        renamed.volunteer().map(|v| v.name.as_str()),
        Some("Tess Fixit")
    );
    assert_eq!(renamed.volunteer_id(), Some(&volunteer));
}

#[rstest]
fn rename_of_someone_else_leaves_volunteer_alone() {
    let volunteer = UserId::random();
    let original = assigned_to(volunteer, "Tess");
    let untouched = original
        .clone()
        .with_volunteer_name(&UserId::random(), "Intruder");
    assert_eq!(untouched, original);

    let open = complaint("Open", false, date(1, 1), created(0));
    assert_eq!(open.clone().with_volunteer_name(&volunteer, "Tess"), open);
}

#[rstest]
fn filter_matches_set_criteria_only() {
    let target = complaint("x", false, date(1, 1), created(0));
    let filter = ComplaintFilter {
        raised_by: Some(*target.raised_by()),
        status: Some(ComplaintStatus::Open),
        ..ComplaintFilter::default()
    };
    assert!(filter.matches(&target));
    assert!(ComplaintFilter::default().matches(&target));
    let other = ComplaintFilter {
        volunteer_id: Some(UserId::random()),
        ..ComplaintFilter::default()
    };
    assert!(!other.matches(&target));
}

#[rstest]
fn other_category_is_handled_by_everyone() {
    let other = Category::new("Other").expect("valid category");
    let plumbing = Category::new("plumbing").expect("valid category");
    let department = crate::domain::Department::new("electrical").expect("valid department");
    assert!(other.is_handled_by(&department));
    assert!(!plumbing.is_handled_by(&department));
}
