//! SeaORM adapter for the session store - generic over ConnectionTrait.
//!
//! Conditional writes are single `UPDATE ... WHERE phase = ? [AND version = ?]
//! [AND topic_conflict_count = ?] RETURNING *` statements; conditional inserts
//! use `ON CONFLICT DO NOTHING` and check the affected row count.
//!
//! Change notifications go through an in-process feed, so observers in other
//! processes should run in poll mode.

use async_trait::async_trait;
use futures::stream::BoxStream;
use sea_orm::sea_query::{Alias, Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use time::OffsetDateTime;

use crate::domain::ids::SessionId;
use crate::domain::roster::{Participant, RoleAssignment};
use crate::domain::session::{
    deadline_for, Judgment, Session, SessionState, SessionStatus, Submission,
};
use crate::entities::{
    dispatch_claims, judgments, participants, session_states, sessions, submissions,
};
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::infra::db_errors::{map_db_err, OPTIMISTIC_LOCK_PREFIX, PHASE_ADVANCED_PREFIX};
use crate::repos::change_feed::{ChangeEvent, ChangeFeed};
use crate::repos::session_store::{
    DispatchClaim, InsertOutcome, SessionStore, StateGuard, StateUpdate,
};

mod convert;

pub use convert::{judgment_from_row, state_from_row, submission_from_row};

// Adapter functions return DbErr; the store impl maps to DomainError.

fn session_not_found(session_id: &str) -> sea_orm::DbErr {
    sea_orm::DbErr::Custom(format!("SESSION_NOT_FOUND:{session_id}"))
}

fn count_to_db(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn outcome(rows_affected: u64) -> InsertOutcome {
    if rows_affected == 0 {
        InsertOutcome::AlreadyExists
    } else {
        InsertOutcome::Inserted
    }
}

/// Apply `update` under `guard`, returning the updated row.
///
/// On zero matching rows the current row is re-read to tell apart a missing
/// session, an advanced phase and a version/count mismatch.
pub async fn conditional_state_update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    guard: &StateGuard,
    update: &StateUpdate,
) -> Result<session_states::Model, sea_orm::DbErr> {
    use session_states::Column;

    let now = OffsetDateTime::now_utc();
    let mut query = session_states::Entity::update_many()
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1));

    if let Some((phase, entered_at)) = update.enter_phase {
        query = query
            .col_expr(Column::Phase, Expr::value(phase.as_str()))
            .col_expr(Column::PhaseEnteredAt, Expr::value(entered_at))
            .col_expr(
                Column::TimerDeadline,
                Expr::value(deadline_for(phase, entered_at)),
            );
    }
    if let Some(topic) = &update.topic {
        query = query.col_expr(Column::Topic, Expr::value(Some(topic.clone())));
    }
    if let Some(count) = update.topic_conflict_count {
        query = query.col_expr(Column::TopicConflictCount, Expr::value(count_to_db(count)));
    }
    if let Some(pick) = &update.pro_pick {
        query = query.col_expr(
            Column::ProPick,
            Expr::value(pick.as_ref().map(|p| p.as_str().to_string())),
        );
    }
    if let Some(pick) = &update.con_pick {
        query = query.col_expr(
            Column::ConPick,
            Expr::value(pick.as_ref().map(|p| p.as_str().to_string())),
        );
    }

    query = query
        .filter(Column::SessionId.eq(session_id))
        .filter(Column::Phase.eq(guard.phase.as_str()));
    if let Some(version) = guard.version {
        query = query.filter(Column::Version.eq(version));
    }
    if let Some(count) = guard.topic_conflict_count {
        query = query.filter(Column::TopicConflictCount.eq(count_to_db(count)));
    }

    let mut rows = query.exec_with_returning(conn).await?;
    if let Some(row) = rows.pop() {
        return Ok(row);
    }

    let current = session_states::Entity::find_by_id(session_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| session_not_found(session_id))?;
    if current.phase != guard.phase.as_str() {
        return Err(sea_orm::DbErr::Custom(format!(
            "{PHASE_ADVANCED_PREFIX}expected phase {}, found {}",
            guard.phase, current.phase
        )));
    }
    let payload = format!(
        "{OPTIMISTIC_LOCK_PREFIX}{{\"expected\":{},\"actual\":{}}}",
        guard.version.unwrap_or(current.version),
        current.version
    );
    Err(sea_orm::DbErr::Custom(payload))
}

/// Keep `sessions.status` in line with the phase just written.
async fn sync_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    state: &session_states::Model,
    status: SessionStatus,
) -> Result<(), sea_orm::DbErr> {
    sessions::Entity::update_many()
        .col_expr(
            sessions::Column::Status,
            Expr::val(convert::status_to_row(status)).cast_as(Alias::new("session_status")),
        )
        .col_expr(sessions::Column::UpdatedAt, Expr::value(state.updated_at))
        .filter(sessions::Column::Id.eq(state.session_id.clone()))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn create_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    name: &str,
) -> Result<sessions::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let id = SessionId::generate();
    let initial = SessionState::initial(id.clone(), now);

    let session = sessions::ActiveModel {
        id: Set(id.as_str().to_string()),
        name: Set(name.to_string()),
        status: Set(sessions::SessionStatus::Forming),
        created_at: Set(now),
        updated_at: Set(now),
    };
    sessions::Entity::insert(session).exec_without_returning(conn).await?;

    let state = session_states::ActiveModel {
        session_id: Set(id.as_str().to_string()),
        phase: Set(initial.phase.as_str().to_string()),
        timer_deadline: Set(None),
        phase_entered_at: Set(now),
        topic: Set(None),
        topic_conflict_count: Set(0),
        pro_pick: Set(None),
        con_pick: Set(None),
        version: Set(initial.version),
        updated_at: Set(now),
    };
    session_states::Entity::insert(state)
        .exec_without_returning(conn)
        .await?;

    sessions::Entity::find_by_id(id.as_str().to_string())
        .one(conn)
        .await?
        .ok_or_else(|| session_not_found(id.as_str()))
}

pub async fn insert_participant<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant: &Participant,
) -> Result<u64, sea_orm::DbErr> {
    let row = participants::ActiveModel {
        id: Set(participant.id.as_str().to_string()),
        session_id: Set(participant.session_id.as_str().to_string()),
        display_name: Set(participant.display_name.clone()),
        is_automated: Set(participant.is_automated),
        role: Set(participant.role.map(convert::role_to_row)),
        team: Set(participant.team.map(convert::team_to_row)),
        created_at: Set(OffsetDateTime::now_utc()),
    };
    participants::Entity::insert(row)
        .on_conflict(
            OnConflict::column(participants::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
}

pub async fn insert_submission<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    submission: &Submission,
) -> Result<u64, sea_orm::DbErr> {
    use submissions::Column;

    let row = submissions::ActiveModel {
        id: Set(submission.id.clone()),
        session_id: Set(submission.session_id.as_str().to_string()),
        participant_id: Set(submission.participant_id.as_str().to_string()),
        phase: Set(submission.phase.as_str().to_string()),
        content: Set(submission.content.clone()),
        created_at: Set(submission.created_at),
    };
    submissions::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([Column::SessionId, Column::ParticipantId, Column::Phase])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
}

pub async fn insert_claim<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    claim: &DispatchClaim,
) -> Result<u64, sea_orm::DbErr> {
    use dispatch_claims::Column;

    let row = dispatch_claims::ActiveModel {
        session_id: Set(claim.session_id.as_str().to_string()),
        phase: Set(claim.phase.as_str().to_string()),
        target: Set(claim.target.key()),
        claimed_at: Set(OffsetDateTime::now_utc()),
    };
    dispatch_claims::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([Column::SessionId, Column::Phase, Column::Target])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
}

pub async fn delete_claim<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    claim: &DispatchClaim,
) -> Result<(), sea_orm::DbErr> {
    use dispatch_claims::Column;

    dispatch_claims::Entity::delete_many()
        .filter(Column::SessionId.eq(claim.session_id.as_str()))
        .filter(Column::Phase.eq(claim.phase.as_str()))
        .filter(Column::Target.eq(claim.target.key()))
        .exec(conn)
        .await?;
    Ok(())
}

/// `DELETE ... WHERE claimed_at < stale_before`; the row count tells the
/// caller whether it won the takeover.
pub async fn delete_stale_claim<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    claim: &DispatchClaim,
    stale_before: OffsetDateTime,
) -> Result<u64, sea_orm::DbErr> {
    use dispatch_claims::Column;

    let result = dispatch_claims::Entity::delete_many()
        .filter(Column::SessionId.eq(claim.session_id.as_str()))
        .filter(Column::Phase.eq(claim.phase.as_str()))
        .filter(Column::Target.eq(claim.target.key()))
        .filter(Column::ClaimedAt.lt(stale_before))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn insert_judgment<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    judgment: &Judgment,
) -> Result<u64, sea_orm::DbErr> {
    let scores = serde_json::to_value(&judgment.scores)
        .map_err(|e| sea_orm::DbErr::Custom(format!("judgment scores: {e}")))?;
    let row = judgments::ActiveModel {
        session_id: Set(judgment.session_id.as_str().to_string()),
        verdict: Set(judgment.verdict.as_str().to_string()),
        scores: Set(scores),
        overall_analysis: Set(judgment.overall_analysis.clone()),
        created_at: Set(judgment.created_at),
    };
    judgments::Entity::insert(row)
        .on_conflict(
            OnConflict::column(judgments::Column::SessionId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
}

pub struct SeaSessionStore {
    conn: DatabaseConnection,
    feed: ChangeFeed,
}

impl SeaSessionStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            feed: ChangeFeed::new(),
        }
    }

    async fn write_state(
        &self,
        session_id: &SessionId,
        guard: &StateGuard,
        update: &StateUpdate,
        assignments: &[RoleAssignment],
    ) -> Result<SessionState, sea_orm::DbErr> {
        let txn = self.conn.begin().await?;

        if !assignments.is_empty() {
            let ids: Vec<String> = assignments
                .iter()
                .map(|a| a.participant_id.as_str().to_string())
                .collect();
            let present = participants::Entity::find()
                .filter(participants::Column::SessionId.eq(session_id.as_str()))
                .filter(participants::Column::Id.is_in(ids.clone()))
                .count(&txn)
                .await?;
            if present != ids.len() as u64 {
                return Err(sea_orm::DbErr::RecordNotFound(format!(
                    "participant missing from session {session_id}"
                )));
            }
        }

        let row = conditional_state_update(&txn, session_id.as_str(), guard, update).await?;
        if update.enter_phase.is_some() {
            let state = state_from_row(row.clone())
                .map_err(|e| sea_orm::DbErr::Custom(e.to_string()))?;
            sync_status(&txn, &row, SessionStatus::for_phase(state.phase)).await?;
        }

        for assignment in assignments {
            participants::Entity::update_many()
                .col_expr(
                    participants::Column::Role,
                    Expr::val(convert::role_to_row(assignment.role))
                        .cast_as(Alias::new("debate_role")),
                )
                .col_expr(
                    participants::Column::Team,
                    Expr::val(convert::team_to_row(assignment.team))
                        .cast_as(Alias::new("debate_team")),
                )
                .filter(participants::Column::Id.eq(assignment.participant_id.as_str()))
                .filter(participants::Column::SessionId.eq(session_id.as_str()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        state_from_row(row).map_err(|e| sea_orm::DbErr::Custom(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for SeaSessionStore {
    async fn create_session(&self, name: &str) -> Result<Session, DomainError> {
        let txn = self.conn.begin().await.map_err(map_db_err)?;
        let row = create_session(&txn, name).await.map_err(map_db_err)?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(Session::from(row))
    }

    async fn load_session(&self, session_id: &SessionId) -> Result<Session, DomainError> {
        sessions::Entity::find_by_id(session_id.as_str().to_string())
            .one(&self.conn)
            .await
            .map_err(map_db_err)?
            .map(Session::from)
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Session,
                    format!("Session {session_id} not found"),
                )
            })
    }

    async fn load_state(&self, session_id: &SessionId) -> Result<SessionState, DomainError> {
        let row = session_states::Entity::find_by_id(session_id.as_str().to_string())
            .one(&self.conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Session,
                    format!("Session {session_id} not found"),
                )
            })?;
        state_from_row(row)
    }

    async fn load_roster(&self, session_id: &SessionId) -> Result<Vec<Participant>, DomainError> {
        let rows = participants::Entity::find()
            .filter(participants::Column::SessionId.eq(session_id.as_str()))
            .order_by_asc(participants::Column::Id)
            .all(&self.conn)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Participant::from).collect())
    }

    async fn load_submissions(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Submission>, DomainError> {
        let rows = submissions::Entity::find()
            .filter(submissions::Column::SessionId.eq(session_id.as_str()))
            .order_by_asc(submissions::Column::CreatedAt)
            .order_by_asc(submissions::Column::Id)
            .all(&self.conn)
            .await
            .map_err(map_db_err)?;
        rows.into_iter().map(submission_from_row).collect()
    }

    async fn load_judgment(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<Judgment>, DomainError> {
        judgments::Entity::find_by_id(session_id.as_str().to_string())
            .one(&self.conn)
            .await
            .map_err(map_db_err)?
            .map(judgment_from_row)
            .transpose()
    }

    async fn add_participant(
        &self,
        participant: Participant,
    ) -> Result<InsertOutcome, DomainError> {
        let rows = insert_participant(&self.conn, &participant)
            .await
            .map_err(map_db_err)?;
        let result = outcome(rows);
        if result.inserted() {
            self.feed.publish(ChangeEvent::RosterChanged {
                session_id: participant.session_id,
            });
        }
        Ok(result)
    }

    async fn update_state_if(
        &self,
        session_id: &SessionId,
        guard: &StateGuard,
        update: StateUpdate,
    ) -> Result<SessionState, DomainError> {
        let state = self
            .write_state(session_id, guard, &update, &[])
            .await
            .map_err(map_db_err)?;
        self.feed.publish(ChangeEvent::StateChanged {
            session_id: session_id.clone(),
            version: state.version,
        });
        Ok(state)
    }

    async fn finalize_roles(
        &self,
        session_id: &SessionId,
        guard: &StateGuard,
        update: StateUpdate,
        assignments: &[RoleAssignment],
    ) -> Result<SessionState, DomainError> {
        let state = self
            .write_state(session_id, guard, &update, assignments)
            .await
            .map_err(map_db_err)?;
        self.feed.publish(ChangeEvent::RosterChanged {
            session_id: session_id.clone(),
        });
        self.feed.publish(ChangeEvent::StateChanged {
            session_id: session_id.clone(),
            version: state.version,
        });
        Ok(state)
    }

    async fn insert_submission(
        &self,
        submission: Submission,
    ) -> Result<InsertOutcome, DomainError> {
        let rows = insert_submission(&self.conn, &submission)
            .await
            .map_err(map_db_err)?;
        let result = outcome(rows);
        if result.inserted() {
            self.feed.publish(ChangeEvent::SubmissionAdded {
                session_id: submission.session_id,
            });
        }
        Ok(result)
    }

    async fn claim_dispatch(&self, claim: &DispatchClaim) -> Result<InsertOutcome, DomainError> {
        let rows = insert_claim(&self.conn, claim).await.map_err(map_db_err)?;
        Ok(outcome(rows))
    }

    async fn release_dispatch(&self, claim: &DispatchClaim) -> Result<(), DomainError> {
        delete_claim(&self.conn, claim).await.map_err(map_db_err)
    }

    async fn reclaim_stale_dispatch(
        &self,
        claim: &DispatchClaim,
        stale_before: OffsetDateTime,
    ) -> Result<bool, DomainError> {
        let rows = delete_stale_claim(&self.conn, claim, stale_before)
            .await
            .map_err(map_db_err)?;
        Ok(rows > 0)
    }

    async fn insert_judgment(&self, judgment: Judgment) -> Result<InsertOutcome, DomainError> {
        let rows = insert_judgment(&self.conn, &judgment)
            .await
            .map_err(map_db_err)?;
        let result = outcome(rows);
        if result.inserted() {
            self.feed.publish(ChangeEvent::JudgmentRecorded {
                session_id: judgment.session_id,
            });
        }
        Ok(result)
    }

    fn subscribe(&self, session_id: &SessionId) -> BoxStream<'static, ChangeEvent> {
        self.feed.subscribe(session_id)
    }
}
