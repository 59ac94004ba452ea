use super::*;
use actix_web::{http::StatusCode, test};
use rust_decimal_macros::dec;
use serde_json::json;

fn new_employee(code: &str, email: &str) -> Value {
    json!({
        "employee_code": code,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": email,
        "department": "finance",
        "base_salary": "2200.00",
        "hire_date": "2025-03-01"
    })
}

#[actix_web::test]
async fn officers_create_employees_with_unique_codes() {
    let store = store();
    let app = test_app!(store);

    let create = |body: Value| {
        test::TestRequest::post()
            .uri("/api/employee")
            .insert_header(("Authorization", hr_officer()))
            .set_json(body)
            .to_request()
    };

    let resp = test::call_service(&app, create(new_employee("EMP-7", "ada@city.gov"))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(money(&body["data"]["base_salary"]), dec!(2200));

    let resp = test::call_service(&app, create(new_employee("EMP-7", "other@city.gov"))).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/employee")
            .insert_header(("Authorization", employee(1)))
            .set_json(new_employee("EMP-8", "x@city.gov"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn update_and_read_back() {
    let store = store();
    let id = store.seed_employee("EMP-1", "finance", dec!(2200));
    let app = test_app!(store);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/employee/{id}"))
            .insert_header(("Authorization", admin()))
            .set_json(json!({ "base_salary": 2500, "status": "inactive" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(money(&body["data"]["base_salary"]), dec!(2500));
    assert_eq!(body["data"]["status"], "inactive");

    // employees can read their own profile only
    let own = test::TestRequest::get()
        .uri(&format!("/api/employee/{id}"))
        .insert_header(("Authorization", employee(id)))
        .to_request();
    assert_eq!(test::call_service(&app, own).await.status(), StatusCode::OK);

    let other = test::TestRequest::get()
        .uri(&format!("/api/employee/{id}"))
        .insert_header(("Authorization", employee(id + 1)))
        .to_request();
    assert_eq!(test::call_service(&app, other).await.status(), StatusCode::FORBIDDEN);

    let missing = test::TestRequest::put()
        .uri("/api/employee/5555")
        .insert_header(("Authorization", admin()))
        .set_json(json!({ "first_name": "Nobody" }))
        .to_request();
    assert_eq!(test::call_service(&app, missing).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn referenced_employee_cannot_be_deleted() {
    let store = store();
    let busy = store.seed_employee("EMP-1", "finance", dec!(2200));
    let idle = store.seed_employee("EMP-2", "finance", dec!(2200));
    store.seed_attendance(busy, date(2026, 1, 5), dec!(8));
    let app = test_app!(store);

    let delete = |id: u64| {
        test::TestRequest::delete()
            .uri(&format!("/api/employee/{id}"))
            .insert_header(("Authorization", admin()))
            .to_request()
    };

    assert_eq!(test::call_service(&app, delete(busy)).await.status(), StatusCode::CONFLICT);
    assert_eq!(test::call_service(&app, delete(idle)).await.status(), StatusCode::OK);
    assert_eq!(test::call_service(&app, delete(idle)).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn listing_filters_by_department() {
    let store = store();
    store.seed_employee("EMP-1", "finance", dec!(2200));
    store.seed_employee("EMP-2", "hr", dec!(2200));
    store.seed_employee("EMP-3", "finance", dec!(2200));
    let app = test_app!(store);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/employee?department=FINANCE&per_page=1")
            .insert_header(("Authorization", admin()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
