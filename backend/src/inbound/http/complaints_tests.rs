//! Tests for the complaint handlers.

use super::*;
use crate::domain::{Complaint, ComplaintDraft, Role, User, Volunteer};
use crate::inbound::http::test_utils::{
    MockPorts, establish_session, login_as, sample_complaint, sample_user,
    test_session_middleware,
};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::NaiveDate;
use rstest::rstest;
use serde_json::{Value, json};

fn test_app(
    ports: MockPorts,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(ports.into_state()))
        .wrap(test_session_middleware())
        .service(establish_session)
        .service(
            web::scope("/api/v1")
                .service(create_complaint)
                .service(list_complaints)
                .service(complaint_queue)
                .service(get_complaint)
                .service(accept_complaint)
                .service(transfer_complaint)
                .service(resolve_complaint)
                .service(edit_complaint)
                .service(delete_complaint),
        )
}

fn accepted_by(complaint: Complaint, volunteer: &User) -> Complaint {
    Complaint::new(ComplaintDraft {
        status: ComplaintStatus::InProgress,
        volunteer: Some(Volunteer {
            id: *volunteer.id(),
            name: volunteer.name().to_string(),
        }),
        ..complaint.into_draft()
    })
    .expect("valid in-progress complaint")
}

#[actix_web::test]
async fn create_requires_a_session() {
    let mut ports = MockPorts::default();
    ports.complaints.expect_create().times(0);
    let app = actix_test::init_service(test_app(ports)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/complaints")
            .set_json(json!({"title": "Leaking tap"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_passes_submission_and_returns_created() {
    let student = sample_user("Ada", Role::Student);
    let complaint = sample_complaint(&student);
    let expected_raiser = *student.id();
    let mut ports = MockPorts::default();
    ports
        .complaints
        .expect_create()
        .times(1)
        .withf(move |actor, submission| {
            *actor == expected_raiser
                && submission.title.as_deref() == Some("Leaking tap")
                && submission.difficulty.as_deref() == Some("medium")
                && submission.emergency
                && submission.fix_till_date == NaiveDate::from_ymd_opt(2026, 2, 1)
        })
        .return_once(move |_, _| Ok(complaint));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, student.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/complaints")
            .cookie(cookie)
            .set_json(json!({
                "title": "Leaking tap",
                "description": "Drips all night",
                "category": "plumbing",
                "difficulty": "medium",
                "emergency": true,
                "fixTillDate": "2026-02-01"
            }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["status"], "open");
    assert_eq!(value["points"], 25);
    assert_eq!(value["fixTillDate"], "2026-02-01");
    assert!(value["volunteerId"].is_null());
}

#[actix_web::test]
async fn create_rejects_unparseable_due_date() {
    let student = sample_user("Ada", Role::Student);
    let mut ports = MockPorts::default();
    ports.complaints.expect_create().times(0);
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, student.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/complaints")
            .cookie(cookie)
            .set_json(json!({"title": "Leaking tap", "fixTillDate": "soon"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["details"]["field"], "fixTillDate");
    assert_eq!(value["details"]["code"], "invalid_date");
}

#[actix_web::test]
async fn list_parses_filters() {
    let student = sample_user("Ada", Role::Student);
    let raiser = *student.id();
    let mut ports = MockPorts::default();
    ports
        .complaint_query
        .expect_list()
        .times(1)
        .withf(move |_, filter| {
            filter.raised_by == Some(raiser)
                && filter.status == Some(ComplaintStatus::InProgress)
                && filter.category.as_ref().map(ToString::to_string)
                    == Some("plumbing".to_owned())
                && filter.volunteer_id.is_none()
        })
        .return_once(|_, _| Ok(Vec::new()));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, student.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!(
                "/api/v1/complaints?raisedBy={raiser}&status=in-progress&category=plumbing"
            ))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value, json!([]));
}

#[rstest]
#[case("status=pending", "status", "invalid_value")]
#[case("raisedBy=42", "raisedBy", "invalid_uuid")]
#[case("volunteerId=nope", "volunteerId", "invalid_uuid")]
#[actix_web::test]
async fn list_rejects_bad_filters(
    #[case] query: &str,
    #[case] field: &str,
    #[case] code: &str,
) {
    let student = sample_user("Ada", Role::Student);
    let mut ports = MockPorts::default();
    ports.complaint_query.expect_list().times(0);
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, student.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/complaints?{query}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["details"]["field"], field);
    assert_eq!(value["details"]["code"], code);
}

#[actix_web::test]
async fn queue_route_is_not_shadowed_by_id_route() {
    let volunteer = sample_user("Tess", Role::Technical);
    let raiser = sample_user("Ada", Role::Student);
    let complaint = sample_complaint(&raiser);
    let mut ports = MockPorts::default();
    ports
        .complaint_query
        .expect_queue()
        .times(1)
        .return_once(move |_| Ok(vec![complaint]));
    ports.complaint_query.expect_get().times(0);
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, volunteer.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/complaints/queue")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn accept_returns_in_progress_complaint() {
    let volunteer = sample_user("Tess", Role::Technical);
    let raiser = sample_user("Ada", Role::Student);
    let complaint = sample_complaint(&raiser);
    let id = complaint.id();
    let accepted = accepted_by(complaint, &volunteer);
    let mut ports = MockPorts::default();
    ports
        .complaints
        .expect_transition()
        .times(1)
        .withf(move |_, complaint_id, transition| {
            *complaint_id == id && *transition == Transition::Accept
        })
        .return_once(move |_, _, _| Ok(accepted));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, volunteer.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/complaints/{}/accept", id.as_uuid()))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["status"], "in-progress");
    assert_eq!(value["volunteerId"], volunteer.id().to_string());
    assert_eq!(value["volunteerName"], "Tess");
}

#[rstest]
#[case("transfer", Transition::Transfer)]
#[case("resolve", Transition::Resolve)]
#[actix_web::test]
async fn lost_race_surfaces_as_conflict(#[case] route: &str, #[case] expected: Transition) {
    let volunteer = sample_user("Tess", Role::Technical);
    let mut ports = MockPorts::default();
    ports
        .complaints
        .expect_transition()
        .times(1)
        .withf(move |_, _, transition| *transition == expected)
        .return_once(|_, _, _| Err(Error::conflict("complaint changed concurrently")));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, volunteer.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!(
                "/api/v1/complaints/{}/{route}",
                ComplaintId::random().as_uuid()
            ))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["code"], "conflict");
}

#[actix_web::test]
async fn transition_rejects_malformed_id() {
    let volunteer = sample_user("Tess", Role::Technical);
    let mut ports = MockPorts::default();
    ports.complaints.expect_transition().times(0);
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, volunteer.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/complaints/not-a-uuid/accept")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["details"]["code"], "invalid_uuid");
}

#[actix_web::test]
async fn edit_rejects_status_field() {
    let student = sample_user("Ada", Role::Student);
    let mut ports = MockPorts::default();
    ports.complaints.expect_edit().times(0);
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, student.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!(
                "/api/v1/complaints/{}",
                ComplaintId::random().as_uuid()
            ))
            .cookie(cookie)
            .set_json(json!({"title": "New title", "status": "resolved"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["details"]["field"], "status");
}

#[actix_web::test]
async fn edit_distinguishes_cleared_location() {
    let student = sample_user("Ada", Role::Student);
    let complaint = sample_complaint(&student);
    let id = complaint.id();
    let mut ports = MockPorts::default();
    ports
        .complaints
        .expect_edit()
        .times(1)
        .withf(|_, _, edit| edit.location == Some(None) && edit.title.is_none())
        .return_once(move |_, _, _| Ok(complaint));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, student.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/complaints/{}", id.as_uuid()))
            .cookie(cookie)
            .set_json(json!({"location": null}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[rstest]
#[case(Ok(()), StatusCode::NO_CONTENT)]
#[case(Err(Error::forbidden("administrators only")), StatusCode::FORBIDDEN)]
#[case(Err(Error::not_found("complaint not found")), StatusCode::NOT_FOUND)]
#[actix_web::test]
async fn delete_maps_outcomes(#[case] outcome: Result<(), Error>, #[case] status: StatusCode) {
    let admin = sample_user("Root", Role::Admin);
    let mut ports = MockPorts::default();
    ports
        .complaints
        .expect_delete()
        .times(1)
        .return_once(move |_, _| outcome);
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = login_as(&app, admin.id()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!(
                "/api/v1/complaints/{}",
                ComplaintId::random().as_uuid()
            ))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), status);
}
