use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use url::Url;
use uuid::Uuid;

use crate::llm::VolunteerOpportunity;
use crate::opportunities::{model::Opportunity, store::OpportunityStore};
use crate::sites::StoreError;

const COLUMNS: &str = "id, url, title, organization, tags, location, description, activity_type, \
     time_slot, slot_availability, contact_email, contact_phone, raw, created_at, updated_at";

#[derive(Debug, FromRow)]
struct OpportunityRow {
    id: Uuid,
    url: String,
    title: String,
    organization: String,
    tags: Vec<String>,
    location: String,
    description: Option<String>,
    activity_type: Option<String>,
    time_slot: Option<String>,
    slot_availability: Vec<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    raw: Json<VolunteerOpportunity>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OpportunityRow> for Opportunity {
    type Error = StoreError;

    fn try_from(row: OpportunityRow) -> Result<Self, Self::Error> {
        let url = Url::parse(&row.url).map_err(|e| StoreError::Corrupt {
            key: row.url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Opportunity {
            id: row.id,
            title: row.title,
            organization: row.organization,
            tags: row.tags,
            location: row.location,
            description: row.description,
            activity_type: row.activity_type,
            time_slot: row.time_slot,
            slot_availability: row.slot_availability,
            url,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
            raw: row.raw.0,
        })
    }
}

/// Opportunities in the `opportunities` table; `url` is unique.
#[derive(Clone)]
pub struct PgOpportunityStore {
    pool: PgPool,
}

impl PgOpportunityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OpportunityStore for PgOpportunityStore {
    async fn get_by_url(&self, url: &Url) -> Result<Option<Opportunity>, StoreError> {
        let row = sqlx::query_as::<_, OpportunityRow>(&format!(
            "SELECT {COLUMNS} FROM opportunities WHERE url = $1"
        ))
        .bind(url.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Opportunity::try_from).transpose()
    }

    async fn insert(&self, opportunity: Opportunity) -> Result<Opportunity, StoreError> {
        let inserted = sqlx::query_as::<_, OpportunityRow>(&format!(
            r#"
            INSERT INTO opportunities ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (url) DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(opportunity.id)
        .bind(opportunity.url.as_str())
        .bind(&opportunity.title)
        .bind(&opportunity.organization)
        .bind(&opportunity.tags)
        .bind(&opportunity.location)
        .bind(&opportunity.description)
        .bind(&opportunity.activity_type)
        .bind(&opportunity.time_slot)
        .bind(&opportunity.slot_availability)
        .bind(&opportunity.contact_email)
        .bind(&opportunity.contact_phone)
        .bind(Json(&opportunity.raw))
        .bind(opportunity.created_at)
        .bind(opportunity.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Opportunity::try_from(row),
            // Lost the race to another insert for the same URL.
            None => self
                .get_by_url(&opportunity.url)
                .await?
                .ok_or_else(|| StoreError::Corrupt {
                    key: opportunity.url.to_string(),
                    reason: "conflicting row vanished after insert".to_string(),
                }),
        }
    }
}
