use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    dao::models::{DraftEntity, MatchEntity, MatchResultEntity, ReviewEntity},
    scoresheet::{AttendanceRecord, EventRecord, MatchId, ScorekeeperId, TeamId},
    state::match_lifecycle::MatchStatus,
};

pub const DRAFT_PREFIX: &str = "draft::";
pub const MATCH_PREFIX: &str = "match::";
pub const REVIEW_PREFIX: &str = "review::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Body CouchDB answers to a successful PUT.
#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchMatchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: MatchBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchBody {
    pub match_id: MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub status: MatchStatus,
    #[serde(default)]
    pub scorekeepers: Vec<ScorekeeperId>,
    pub updated_at: SystemTime,
    /// Final sheet, embedded so that closing the match is a single write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<FinalSheetBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalSheetBody {
    pub attendance: Vec<AttendanceRecord>,
    pub events: Vec<EventRecord>,
    pub finalized_at: SystemTime,
}

impl CouchMatchDocument {
    pub fn into_entity(self) -> MatchEntity {
        MatchEntity {
            id: self.body.match_id,
            home_team_id: self.body.home_team_id,
            away_team_id: self.body.away_team_id,
            status: self.body.status,
            scorekeepers: self.body.scorekeepers,
            updated_at: self.body.updated_at,
        }
    }

    pub fn result_entity(&self) -> Option<MatchResultEntity> {
        self.body.result.as_ref().map(|sheet| MatchResultEntity {
            match_id: self.body.match_id,
            attendance: sheet.attendance.clone(),
            events: sheet.events.clone(),
            finalized_at: sheet.finalized_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDraftDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub draft: DraftEntity,
}

impl From<(DraftEntity, Option<String>)> for CouchDraftDocument {
    fn from((draft, rev): (DraftEntity, Option<String>)) -> Self {
        Self {
            id: draft_doc_id(draft.match_id, draft.scorekeeper_id),
            rev,
            draft,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchReviewDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub review: ReviewEntity,
}

impl From<ReviewEntity> for CouchReviewDocument {
    fn from(review: ReviewEntity) -> Self {
        Self {
            id: format!("{}{}", review_prefix(review.match_id), review.id),
            rev: None,
            review,
        }
    }
}

pub fn match_doc_id(id: MatchId) -> String {
    format!("{MATCH_PREFIX}{id}")
}

pub fn draft_doc_id(match_id: MatchId, scorekeeper_id: ScorekeeperId) -> String {
    format!("{}{scorekeeper_id}", draft_prefix(match_id))
}

/// Prefix shared by the drafts of one match.
pub fn draft_prefix(match_id: MatchId) -> String {
    format!("{DRAFT_PREFIX}{match_id}::")
}

/// Prefix shared by the reviews of one match.
pub fn review_prefix(match_id: MatchId) -> String {
    format!("{REVIEW_PREFIX}{match_id}::")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_do_not_collide_across_matches() {
        assert_eq!(draft_doc_id(1, 12), "draft::1::12");
        assert!(!draft_doc_id(11, 2).starts_with(&draft_prefix(1)));
        assert!(!review_prefix(10).starts_with(&review_prefix(1)));
        assert_eq!(match_doc_id(7), "match::7");
    }
}
