//! Offers and their negotiation log.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use talentdesk_core::offer::NegotiationNote;
use talentdesk_core::types::{DbId, Timestamp};

/// A row from the `offers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Offer {
    pub id: DbId,
    pub job_id: Option<DbId>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub position_title: String,
    pub base_salary: i64,
    pub currency: String,
    pub bonus: Option<i64>,
    pub equity: Option<String>,
    pub signing_bonus: Option<i64>,
    pub benefits: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub expires_at: Option<Timestamp>,
    pub negotiation_notes: Json<Vec<NegotiationNote>>,
    pub status: String,
    pub created_by: Option<DbId>,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub sent_at: Option<Timestamp>,
    pub responded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /offers`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOffer {
    pub job_id: Option<DbId>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub position_title: String,
    pub base_salary: i64,
    pub currency: Option<String>,
    pub bonus: Option<i64>,
    pub equity: Option<String>,
    pub signing_bonus: Option<i64>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub expires_at: Option<Timestamp>,
}

/// Body of `PUT /offers/{id}`. Absent fields are left unchanged.
///
/// The nullable terms are `Option<Option<_>>`: absent leaves the stored
/// value, `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOffer {
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    pub position_title: Option<String>,
    pub base_salary: Option<i64>,
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub bonus: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub equity: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub signing_bonus: Option<Option<i64>>,
    pub benefits: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<Timestamp>>,
}

/// Maps a present field, `null` included, to `Some`. Absent fields fall
/// back to `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateOffer {
    /// Whether the update touches compensation or terms.
    pub fn changes_terms(&self) -> bool {
        self.base_salary.is_some()
            || self.currency.is_some()
            || self.bonus.is_some()
            || self.equity.is_some()
            || self.signing_bonus.is_some()
            || self.benefits.is_some()
            || self.start_date.is_some()
            || self.expires_at.is_some()
    }

    /// The bonus after this update is applied to `current`.
    pub fn bonus_after(&self, current: Option<i64>) -> Option<i64> {
        self.bonus.unwrap_or(current)
    }

    /// The signing bonus after this update is applied to `current`.
    pub fn signing_bonus_after(&self, current: Option<i64>) -> Option<i64> {
        self.signing_bonus.unwrap_or(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_clears_and_absent_keeps() {
        let cleared: UpdateOffer = serde_json::from_str(r#"{"bonus": null}"#).unwrap();
        assert_eq!(cleared.bonus, Some(None));
        assert_eq!(cleared.bonus_after(Some(5_000)), None);
        assert!(cleared.changes_terms());

        let untouched: UpdateOffer = serde_json::from_str(r#"{"candidate_name": "Sam"}"#).unwrap();
        assert_eq!(untouched.bonus, None);
        assert_eq!(untouched.bonus_after(Some(5_000)), Some(5_000));
        assert!(!untouched.changes_terms());

        let set: UpdateOffer = serde_json::from_str(r#"{"signing_bonus": 2000}"#).unwrap();
        assert_eq!(set.signing_bonus_after(None), Some(2_000));
    }
}
