use sea_orm::Statement;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::extension::postgres::Type as PgType;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Sessions {
    Table,
    Id,
    Name,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SessionStates {
    Table,
    SessionId,
    Phase,
    TimerDeadline,
    PhaseEnteredAt,
    Topic,
    TopicConflictCount,
    ProPick,
    ConPick,
    Version,
    UpdatedAt,
}

#[derive(Iden)]
enum Participants {
    Table,
    Id,
    SessionId,
    DisplayName,
    IsAutomated,
    Role,
    Team,
    CreatedAt,
}

#[derive(Iden)]
enum Submissions {
    Table,
    Id,
    SessionId,
    ParticipantId,
    Phase,
    Content,
    CreatedAt,
}

#[derive(Iden)]
enum Judgments {
    Table,
    SessionId,
    Verdict,
    Scores,
    OverallAnalysis,
    CreatedAt,
}

#[derive(Iden)]
enum DispatchClaims {
    Table,
    SessionId,
    Phase,
    Target,
    ClaimedAt,
}

#[derive(Iden)]
enum SessionStatusEnum {
    #[iden = "session_status"]
    Type,
}

#[derive(Iden)]
enum DebateRoleEnum {
    #[iden = "debate_role"]
    Type,
}

#[derive(Iden)]
enum DebateTeamEnum {
    #[iden = "debate_team"]
    Type,
}

async fn enum_exists(manager: &SchemaManager<'_>, enum_name: &str) -> Result<bool, DbErr> {
    let result = manager
        .get_connection()
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            format!("SELECT 1 FROM pg_type WHERE typname = '{enum_name}'"),
        ))
        .await?;
    Ok(result.is_some())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Postgres enums
        if !enum_exists(manager, "session_status").await? {
            manager
                .create_type(
                    PgType::create()
                        .as_enum(SessionStatusEnum::Type)
                        .values(["FORMING", "ACTIVE", "CONCLUDED"])
                        .to_owned(),
                )
                .await?;
        }
        if !enum_exists(manager, "debate_role").await? {
            manager
                .create_type(
                    PgType::create()
                        .as_enum(DebateRoleEnum::Type)
                        .values(["PRO", "CON"])
                        .to_owned(),
                )
                .await?;
        }
        if !enum_exists(manager, "debate_team").await? {
            manager
                .create_type(
                    PgType::create()
                        .as_enum(DebateTeamEnum::Type)
                        .values(["A", "B"])
                        .to_owned(),
                )
                .await?;
        }

        // sessions
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::Name).string().not_null())
                    .col(
                        ColumnDef::new(Sessions::Status)
                            .custom(SessionStatusEnum::Type)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // session_states: one coordination record per session
        manager
            .create_table(
                Table::create()
                    .table(SessionStates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionStates::SessionId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SessionStates::Phase).string().not_null())
                    .col(
                        ColumnDef::new(SessionStates::TimerDeadline)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SessionStates::PhaseEnteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SessionStates::Topic).text().null())
                    .col(
                        ColumnDef::new(SessionStates::TopicConflictCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SessionStates::ProPick).string().null())
                    .col(ColumnDef::new(SessionStates::ConPick).string().null())
                    .col(
                        ColumnDef::new(SessionStates::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(SessionStates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_states_session_id")
                            .from(SessionStates::Table, SessionStates::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // participants
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Participants::SessionId).string().not_null())
                    .col(
                        ColumnDef::new(Participants::DisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::IsAutomated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Participants::Role)
                            .custom(DebateRoleEnum::Type)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Participants::Team)
                            .custom(DebateTeamEnum::Type)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_session_id")
                            .from(Participants::Table, Participants::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_participants_session_id")
                    .table(Participants::Table)
                    .col(Participants::SessionId)
                    .to_owned(),
            )
            .await?;

        // submissions
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Submissions::SessionId).string().not_null())
                    .col(
                        ColumnDef::new(Submissions::ParticipantId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::Phase).string().not_null())
                    .col(ColumnDef::new(Submissions::Content).text().not_null())
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_session_id")
                            .from(Submissions::Table, Submissions::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_participant_id")
                            .from(Submissions::Table, Submissions::ParticipantId)
                            .to(Participants::Table, Participants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // at most one submission per participant per phase
        manager
            .create_index(
                Index::create()
                    .name("ux_submissions_session_participant_phase")
                    .table(Submissions::Table)
                    .col(Submissions::SessionId)
                    .col(Submissions::ParticipantId)
                    .col(Submissions::Phase)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_submissions_session_created")
                    .table(Submissions::Table)
                    .col(Submissions::SessionId)
                    .col(Submissions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // judgments
        manager
            .create_table(
                Table::create()
                    .table(Judgments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Judgments::SessionId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Judgments::Verdict).string().not_null())
                    .col(ColumnDef::new(Judgments::Scores).json_binary().not_null())
                    .col(
                        ColumnDef::new(Judgments::OverallAnalysis)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Judgments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_judgments_session_id")
                            .from(Judgments::Table, Judgments::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_judgments_session")
                    .table(Judgments::Table)
                    .col(Judgments::SessionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // dispatch_claims: one outstanding generation per (session, phase, target)
        manager
            .create_table(
                Table::create()
                    .table(DispatchClaims::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DispatchClaims::SessionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DispatchClaims::Phase).string().not_null())
                    .col(ColumnDef::new(DispatchClaims::Target).string().not_null())
                    .col(
                        ColumnDef::new(DispatchClaims::ClaimedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("ux_dispatch_claims_session_phase_target")
                            .col(DispatchClaims::SessionId)
                            .col(DispatchClaims::Phase)
                            .col(DispatchClaims::Target),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dispatch_claims_session_id")
                            .from(DispatchClaims::Table, DispatchClaims::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // drop in reverse order + drop index before table
        manager
            .drop_table(Table::drop().table(DispatchClaims::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ux_judgments_session")
                    .table(Judgments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Judgments::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ix_submissions_session_created")
                    .table(Submissions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("ux_submissions_session_participant_phase")
                    .table(Submissions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ix_participants_session_id")
                    .table(Participants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Participants::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SessionStates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;

        manager
            .drop_type(
                PgType::drop()
                    .name(DebateTeamEnum::Type)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(
                PgType::drop()
                    .name(DebateRoleEnum::Type)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(
                PgType::drop()
                    .name(SessionStatusEnum::Type)
                    .if_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
