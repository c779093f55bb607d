use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::{DraftEntity, EventDraftEntity, MatchEntity, ReviewEntity, ReviewOutcome},
    scoresheet::{AttendanceRecord, EventRecord, MatchId, ScorekeeperId, TeamId},
    state::match_lifecycle::MatchStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    pub id: MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub status: MatchStatus,
    #[serde(default)]
    pub scorekeepers: Vec<ScorekeeperId>,
    pub updated_at: DateTime,
    /// Set when the final sheet was written.
    #[serde(default)]
    pub finalized_at: Option<DateTime>,
}

impl From<MongoMatchDocument> for MatchEntity {
    fn from(value: MongoMatchDocument) -> Self {
        Self {
            id: value.id,
            home_team_id: value.home_team_id,
            away_team_id: value.away_team_id,
            status: value.status,
            scorekeepers: value.scorekeepers,
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDraft {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: EventRecord,
    pub recorded_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDraftDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub match_id: MatchId,
    pub scorekeeper_id: ScorekeeperId,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub events: Vec<MongoEventDraft>,
    #[serde(default)]
    pub submitted: bool,
    pub updated_at: DateTime,
}

impl From<DraftEntity> for MongoDraftDocument {
    fn from(value: DraftEntity) -> Self {
        Self {
            id: draft_doc_id(value.match_id, value.scorekeeper_id),
            match_id: value.match_id,
            scorekeeper_id: value.scorekeeper_id,
            attendance: value.attendance,
            events: value
                .events
                .into_iter()
                .map(|event| MongoEventDraft {
                    id: event.id,
                    record: event.record,
                    recorded_at: DateTime::from_system_time(event.recorded_at),
                })
                .collect(),
            submitted: value.submitted,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoDraftDocument> for DraftEntity {
    fn from(value: MongoDraftDocument) -> Self {
        Self {
            match_id: value.match_id,
            scorekeeper_id: value.scorekeeper_id,
            attendance: value.attendance,
            events: value
                .events
                .into_iter()
                .map(|event| EventDraftEntity {
                    id: event.id,
                    record: event.record,
                    recorded_at: event.recorded_at.to_system_time(),
                })
                .collect(),
            submitted: value.submitted,
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoReviewDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub match_id: MatchId,
    pub reviewer: String,
    pub outcome: ReviewOutcome,
    #[serde(default)]
    pub comment: Option<String>,
    pub reviewed_at: DateTime,
}

impl From<ReviewEntity> for MongoReviewDocument {
    fn from(value: ReviewEntity) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            reviewer: value.reviewer,
            outcome: value.outcome,
            comment: value.comment,
            reviewed_at: DateTime::from_system_time(value.reviewed_at),
        }
    }
}

impl From<MongoReviewDocument> for ReviewEntity {
    fn from(value: MongoReviewDocument) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            reviewer: value.reviewer,
            outcome: value.outcome,
            comment: value.comment,
            reviewed_at: value.reviewed_at.to_system_time(),
        }
    }
}

/// Drafts are keyed by `<match>:<scorekeeper>` so upserts stay single-document.
pub fn draft_doc_id(match_id: MatchId, scorekeeper_id: ScorekeeperId) -> String {
    format!("{match_id}:{scorekeeper_id}")
}

pub fn match_filter(match_id: MatchId) -> Document {
    doc! {"match_id": match_id}
}
