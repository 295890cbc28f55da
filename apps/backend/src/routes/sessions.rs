//! Session HTTP routes.
//!
//! Role-selection and transition endpoints answer 200 with a no-op outcome
//! when the session has already moved past the phase they act on.

use std::str::FromStr;

use actix_web::http::header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::roster::Role;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::http::etag::{if_none_match_hits, snapshot_etag};
use crate::services::debate_flow::{
    AdvanceOutcome, DispatchOutcome, JudgingOutcome, StartOutcome, SubmitOutcome,
};
use crate::state::app_state::AppState;

fn session_id(path: web::Path<String>) -> SessionId {
    SessionId::from(path.into_inner())
}

fn require_participant(raw: Option<String>) -> Result<ParticipantId, AppError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(ParticipantId::from)
        .ok_or_else(|| {
            DomainError::validation(ValidationKind::MissingIdentity, "participant_id is required")
                .into()
        })
}

fn parse_phase(raw: &str) -> Result<Phase, AppError> {
    Ok(Phase::from_str(raw)?)
}

#[derive(Debug, Serialize)]
struct OutcomeResponse {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phase: Option<Phase>,
}

impl OutcomeResponse {
    fn new(outcome: &'static str) -> Self {
        Self {
            outcome,
            phase: None,
        }
    }

    fn advance(outcome: &AdvanceOutcome) -> Self {
        Self {
            outcome: outcome.as_str(),
            phase: match outcome {
                AdvanceOutcome::Advanced(state) => Some(state.phase),
                AdvanceOutcome::Noop => None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    name: String,
}

/// POST /api/sessions
async fn create_session(
    app_state: web::Data<AppState>,
    body: web::Json<CreateSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let session = app_state.flow.create_session(&body.name).await?;
    Ok(HttpResponse::Created().json(session))
}

/// GET /api/sessions/{id}
///
/// Full snapshot with a weak ETag covering every part of the body.
async fn get_snapshot(
    http_req: HttpRequest,
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let snapshot = app_state.flow.store().load_snapshot(&id).await?;
    let etag = snapshot_etag(&snapshot);

    let not_modified = http_req
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| if_none_match_hits(v, &etag));
    if not_modified {
        return Ok(HttpResponse::build(StatusCode::NOT_MODIFIED)
            .insert_header((ETAG, etag))
            .finish());
    }

    Ok(HttpResponse::Ok()
        .insert_header((ETAG, etag))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .json(snapshot))
}

/// GET /api/sessions/{id}/events
///
/// Server-sent change notifications. Best effort; clients re-read the
/// snapshot on each event and poll when the stream drops.
async fn events(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    app_state.flow.store().load_session(&id).await?;
    let stream = app_state.flow.store().subscribe(&id).map(|event| {
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok::<_, actix_web::Error>(web::Bytes::from(format!("data: {payload}\n\n")))
    });
    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(stream))
}

#[derive(Debug, Deserialize)]
struct JoinRequest {
    display_name: String,
}

/// POST /api/sessions/{id}/participants
async fn join(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
    body: web::Json<JoinRequest>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let participant = app_state.flow.join_session(&id, &body.display_name).await?;
    app_state.observe(&id, &participant.id);
    Ok(HttpResponse::Created().json(participant))
}

/// POST /api/sessions/{id}/start
async fn start(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let response = match app_state.flow.start_session(&id).await? {
        StartOutcome::Started(state) => OutcomeResponse {
            outcome: "started",
            phase: Some(state.phase),
        },
        StartOutcome::NotReady => OutcomeResponse::new("not_ready"),
        StartOutcome::Noop => OutcomeResponse::new("noop"),
    };
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    participant_id: Option<String>,
    content: String,
    /// Phase the client was answering.
    phase: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    outcome: &'static str,
    advanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_phase: Option<Phase>,
}

/// POST /api/sessions/{id}/submissions
async fn submit(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
    body: web::Json<SubmitRequest>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let body = body.into_inner();
    let participant_id = require_participant(body.participant_id)?;
    let expected = body.phase.as_deref().map(parse_phase).transpose()?;

    let outcome = app_state
        .flow
        .submit(&id, &participant_id, &body.content, expected)
        .await?;
    let response = SubmitResponse {
        outcome: outcome.as_str(),
        advanced: matches!(&outcome, SubmitOutcome::Accepted { advance } if advance.advanced()),
        current_phase: match outcome {
            SubmitOutcome::PhaseClosed { current } => Some(current),
            _ => None,
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Deserialize)]
struct AdvanceRequest {
    expected_phase: String,
}

/// POST /api/sessions/{id}/advance
///
/// Timer-expiry callback: the phase the caller's countdown was started for.
async fn advance(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
    body: web::Json<AdvanceRequest>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let expected = parse_phase(&body.expected_phase)?;
    let outcome = app_state.flow.try_advance(&id, expected).await?;
    Ok(HttpResponse::Ok().json(OutcomeResponse::advance(&outcome)))
}

#[derive(Debug, Deserialize)]
struct PickRequest {
    participant_id: Option<String>,
    role: String,
}

/// POST /api/sessions/{id}/roles/pick
async fn pick_role(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
    body: web::Json<PickRequest>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let body = body.into_inner();
    let participant_id = require_participant(body.participant_id)?;
    let role = Role::from_str(&body.role)?;
    let outcome = app_state
        .flow
        .select_role(&id, &participant_id, role)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/sessions/{id}/roles/finalize
async fn finalize_roles(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let outcome = app_state.flow.finalize_with_distinct_roles(&id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[derive(Debug, Deserialize)]
struct RetryTopicRequest {
    current_conflict_count: u32,
}

/// POST /api/sessions/{id}/roles/retry-topic
async fn retry_topic(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
    body: web::Json<RetryTopicRequest>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let outcome = app_state
        .flow
        .retry_with_new_topic(&id, body.current_conflict_count)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/sessions/{id}/roles/assign-random
async fn assign_random(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let outcome = app_state.flow.assign_randomly(&id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[derive(Debug, Deserialize)]
struct AutomatedTurnRequest {
    phase: String,
    target_participant_id: Option<String>,
}

/// POST /api/sessions/{id}/automated-turns
async fn automated_turn(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
    body: web::Json<AutomatedTurnRequest>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let body = body.into_inner();
    let phase = parse_phase(&body.phase)?;
    let target = require_participant(body.target_participant_id)?;
    let outcome = app_state
        .flow
        .produce_automated_turn(&id, phase, &target)
        .await?;
    let response = match &outcome {
        DispatchOutcome::Produced { advance } => OutcomeResponse {
            outcome: outcome.as_str(),
            phase: match advance {
                AdvanceOutcome::Advanced(state) => Some(state.phase),
                AdvanceOutcome::Noop => None,
            },
        },
        other => OutcomeResponse::new(other.as_str()),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/sessions/{id}/judgment
async fn judgment(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = session_id(path);
    let outcome = match app_state.flow.run_judging(&id).await? {
        JudgingOutcome::Concluded => "concluded",
        JudgingOutcome::InFlight => "in_flight",
        JudgingOutcome::Noop => "noop",
    };
    Ok(HttpResponse::Ok().json(OutcomeResponse::new(outcome)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create_session))
        .route("/{session_id}", web::get().to(get_snapshot))
        .route("/{session_id}/events", web::get().to(events))
        .route("/{session_id}/participants", web::post().to(join))
        .route("/{session_id}/start", web::post().to(start))
        .route("/{session_id}/submissions", web::post().to(submit))
        .route("/{session_id}/advance", web::post().to(advance))
        .route("/{session_id}/roles/pick", web::post().to(pick_role))
        .route("/{session_id}/roles/finalize", web::post().to(finalize_roles))
        .route("/{session_id}/roles/retry-topic", web::post().to(retry_topic))
        .route("/{session_id}/roles/assign-random", web::post().to(assign_random))
        .route("/{session_id}/automated-turns", web::post().to(automated_turn))
        .route("/{session_id}/judgment", web::post().to(judgment));
}
