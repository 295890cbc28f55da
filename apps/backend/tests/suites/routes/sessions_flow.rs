use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, Error};
use serde_json::{json, Value};

use crate::common::{ok_json, trace_header};
use crate::support::app_builder::{create_test_app, scripted_state};

async fn post<S>(app: &S, uri: &str, body: Value) -> ServiceResponse<BoxBody>
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .set_json(body)
        .to_request();
    test::call_service(app, req).await
}

#[actix_web::test]
async fn two_humans_reach_the_first_rebuttal_over_http() {
    let app = create_test_app(scripted_state().await)
        .with_prod_routes()
        .build()
        .await
        .expect("create test app");

    let created = post(&app, "/api/sessions", json!({ "name": "Lunch debate" })).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    trace_header(&created);
    let session = ok_json(created).await;
    assert_eq!(session["status"], "forming");
    let id = session["id"].as_str().expect("session id").to_string();
    let base = format!("/api/sessions/{id}");

    let mut humans = Vec::new();
    for name in ["Alice", "Bob"] {
        let joined = post(
            &app,
            &format!("{base}/participants"),
            json!({ "display_name": name }),
        )
        .await;
        assert_eq!(joined.status(), StatusCode::CREATED);
        let participant = ok_json(joined).await;
        assert_eq!(participant["is_automated"], false);
        humans.push(participant["id"].as_str().expect("participant id").to_string());
    }

    let started = ok_json(post(&app, &format!("{base}/start"), json!({})).await).await;
    assert_eq!(started, json!({ "outcome": "started", "phase": "role_selection" }));

    let waiting = ok_json(
        post(
            &app,
            &format!("{base}/roles/pick"),
            json!({ "participant_id": humans[0], "role": "pro" }),
        )
        .await,
    )
    .await;
    assert_eq!(waiting["outcome"], "waiting");
    let finalized = ok_json(
        post(
            &app,
            &format!("{base}/roles/pick"),
            json!({ "participant_id": humans[1], "role": "con" }),
        )
        .await,
    )
    .await;
    assert_eq!(finalized["outcome"], "started");

    let accepted = ok_json(
        post(
            &app,
            &format!("{base}/submissions"),
            json!({
                "participant_id": humans[0],
                "content": "Free lunches pay for themselves.",
                "phase": "opening_claim"
            }),
        )
        .await,
    )
    .await;
    assert_eq!(accepted, json!({ "outcome": "accepted", "advanced": false }));

    // the opening timer expires
    let advanced = ok_json(
        post(
            &app,
            &format!("{base}/advance"),
            json!({ "expected_phase": "opening_claim" }),
        )
        .await,
    )
    .await;
    assert_eq!(
        advanced,
        json!({ "outcome": "advanced", "phase": "cycle1_pro_rebuttal" })
    );
    let repeated = ok_json(
        post(
            &app,
            &format!("{base}/advance"),
            json!({ "expected_phase": "opening_claim" }),
        )
        .await,
    )
    .await;
    assert_eq!(repeated, json!({ "outcome": "noop" }));

    let late = ok_json(
        post(
            &app,
            &format!("{base}/submissions"),
            json!({
                "participant_id": humans[1],
                "content": "Late opening",
                "phase": "opening_claim"
            }),
        )
        .await,
    )
    .await;
    assert_eq!(
        late,
        json!({
            "outcome": "phase_closed",
            "advanced": false,
            "current_phase": "cycle1_pro_rebuttal"
        })
    );

    let req = test::TestRequest::get().uri(&base).to_request();
    let snapshot = ok_json(test::call_service(&app, req).await).await;
    assert_eq!(snapshot["state"]["phase"], "cycle1_pro_rebuttal");
    assert_eq!(snapshot["roster"].as_array().map(Vec::len), Some(4));
    assert_eq!(snapshot["submissions"].as_array().map(Vec::len), Some(1));
    assert_eq!(snapshot["judgment"], Value::Null);
}

#[actix_web::test]
async fn automated_turn_and_judgment_endpoints() {
    let app = create_test_app(scripted_state().await)
        .with_prod_routes()
        .build()
        .await
        .expect("create test app");

    let session = ok_json(post(&app, "/api/sessions", json!({ "name": "Robots" })).await).await;
    let id = session["id"].as_str().expect("session id").to_string();
    let base = format!("/api/sessions/{id}");
    for name in ["Ann", "Ben"] {
        let joined = post(
            &app,
            &format!("{base}/participants"),
            json!({ "display_name": name }),
        )
        .await;
        assert_eq!(joined.status(), StatusCode::CREATED);
    }
    ok_json(post(&app, &format!("{base}/start"), json!({})).await).await;
    let random = ok_json(post(&app, &format!("{base}/roles/assign-random"), json!({})).await).await;
    assert_eq!(random["outcome"], "started_random");

    let bot_pro = format!("{id}-auto-1");
    let produced = ok_json(
        post(
            &app,
            &format!("{base}/automated-turns"),
            json!({ "phase": "opening_claim", "target_participant_id": bot_pro }),
        )
        .await,
    )
    .await;
    assert_eq!(produced, json!({ "outcome": "produced" }));
    let again = ok_json(
        post(
            &app,
            &format!("{base}/automated-turns"),
            json!({ "phase": "opening_claim", "target_participant_id": bot_pro }),
        )
        .await,
    )
    .await;
    assert_eq!(again, json!({ "outcome": "already_produced" }));

    let early = ok_json(post(&app, &format!("{base}/judgment"), json!({})).await).await;
    assert_eq!(early, json!({ "outcome": "noop" }));
}
