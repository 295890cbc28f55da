use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header::{ETAG, IF_NONE_MATCH};
use actix_web::http::StatusCode;
use actix_web::{test, Error};
use serde_json::{json, Value};

use crate::common::ok_json;
use crate::support::app_builder::{create_test_app, scripted_state};

async fn post<S>(app: &S, uri: &str, body: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .set_json(body)
        .to_request();
    ok_json(test::call_service(app, req).await).await
}

/// Conditional GET; returns the status and the ETag served.
async fn revalidate<S>(app: &S, uri: &str, etag: &str) -> (StatusCode, String)
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header((IF_NONE_MATCH, etag.to_string()))
        .to_request();
    let resp = test::call_service(app, req).await;
    let served = resp
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .expect("etag header")
        .to_string();
    (resp.status(), served)
}

#[actix_web::test]
async fn unchanged_snapshot_revalidates_as_not_modified() {
    let app = create_test_app(scripted_state().await)
        .with_prod_routes()
        .build()
        .await
        .expect("create test app");

    let session = post(&app, "/api/sessions", json!({ "name": "Cache me" })).await;
    let id = session["id"].as_str().expect("id").to_string();
    let uri = format!("/api/sessions/{id}");

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let etag = resp
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .expect("etag header")
        .to_string();
    assert_eq!(etag, format!("W/\"session-{id}-v1-r0-s0-j0\""));

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((IF_NONE_MATCH, etag.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    let body = test::read_body(resp).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn joins_and_submissions_change_the_tag() {
    let app = create_test_app(scripted_state().await)
        .with_prod_routes()
        .build()
        .await
        .expect("create test app");

    let session = post(&app, "/api/sessions", json!({ "name": "Polling" })).await;
    let id = session["id"].as_str().expect("id").to_string();
    let uri = format!("/api/sessions/{id}");
    let etag = format!("W/\"session-{id}-v1-r0-s0-j0\"");

    // a join leaves the coordination record alone but changes the roster
    let alice = post(
        &app,
        &format!("{uri}/participants"),
        json!({ "display_name": "Alice" }),
    )
    .await;
    let (status, etag) = revalidate(&app, &uri, &etag).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(etag, format!("W/\"session-{id}-v1-r1-s0-j0\""));

    let bob = post(
        &app,
        &format!("{uri}/participants"),
        json!({ "display_name": "Bob" }),
    )
    .await;
    post(&app, &format!("{uri}/start"), json!({})).await;
    for (participant, role) in [(&alice, "pro"), (&bob, "con")] {
        post(
            &app,
            &format!("{uri}/roles/pick"),
            json!({ "participant_id": participant["id"], "role": role }),
        )
        .await;
    }
    let (status, etag) = revalidate(&app, &uri, &etag).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = revalidate(&app, &uri, &etag).await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);

    // a submission short of completeness does not move the phase
    let accepted = post(
        &app,
        &format!("{uri}/submissions"),
        json!({
            "participant_id": alice["id"],
            "content": "Opening for pro",
            "phase": "opening_claim"
        }),
    )
    .await;
    assert_eq!(accepted, json!({ "outcome": "accepted", "advanced": false }));

    let (status, fresh) = revalidate(&app, &uri, &etag).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(fresh, etag);
    assert!(fresh.ends_with("-s1-j0\""), "{fresh}");
}
