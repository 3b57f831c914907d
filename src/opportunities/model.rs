use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::llm::VolunteerOpportunity;

const UNTITLED: &str = "Untitled Opportunity";
const NOT_AVAILABLE: &str = "N/A";

/// A scraped opportunity as stored; one record per source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub title: String,
    pub organization: String,
    pub tags: Vec<String>,
    pub location: String,
    pub description: Option<String>,
    pub activity_type: Option<String>,
    pub time_slot: Option<String>,
    pub slot_availability: Vec<String>,
    pub url: Url,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Extractor output the record was built from.
    pub raw: VolunteerOpportunity,
}

impl Opportunity {
    pub fn from_scraped(url: Url, scraped: VolunteerOpportunity) -> Self {
        let now = Utc::now();
        let title = match scraped.activity_type.trim() {
            "" => UNTITLED.to_string(),
            activity => title_case(activity),
        };

        Self {
            id: Uuid::new_v4(),
            title,
            organization: scraped.organization_name.clone(),
            tags: scraped.tags.iter().map(|tag| tag.to_lowercase()).collect(),
            location: scraped.location.clone(),
            description: present(&scraped.extra),
            activity_type: present(&scraped.activity_type),
            time_slot: present(&scraped.time_slot),
            slot_availability: scraped.slot_availability.clone(),
            url,
            contact_email: present(&scraped.contact_email),
            contact_phone: (scraped.contact_number != 0).then(|| scraped.contact_number.to_string()),
            created_at: now,
            updated_at: now,
            raw: scraped,
        }
    }
}

/// `None` for blank values and the extractor's "N/A" placeholder.
fn present(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && value != NOT_AVAILABLE).then(|| value.to_string())
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraped() -> VolunteerOpportunity {
        VolunteerOpportunity {
            organization_name: "Riverbank Trust".into(),
            activity_type: "river cleanup and litter picking".into(),
            location: "12 Quay St, Bristol".into(),
            time_slot: "Sa".into(),
            slot_availability: vec!["individual drop-in welcome".into()],
            contact_email: "N/A".into(),
            contact_number: 441179000000,
            extra: "Gloves provided".into(),
            tags: vec!["Environment".into(), "Community".into()],
            url: "https://example.org/cleanup".into(),
        }
    }

    fn url() -> Url {
        Url::parse("https://example.org/cleanup").unwrap()
    }

    #[test]
    fn test_from_scraped_maps_fields() {
        let opportunity = Opportunity::from_scraped(url(), scraped());

        assert_eq!(opportunity.title, "River Cleanup And Litter Picking");
        assert_eq!(opportunity.organization, "Riverbank Trust");
        assert_eq!(opportunity.tags, vec!["environment", "community"]);
        assert_eq!(opportunity.description.as_deref(), Some("Gloves provided"));
        assert_eq!(opportunity.contact_email, None);
        assert_eq!(opportunity.contact_phone.as_deref(), Some("441179000000"));
        assert_eq!(opportunity.created_at, opportunity.updated_at);
        assert_eq!(opportunity.raw, scraped());
    }

    #[test]
    fn test_blank_activity_is_untitled() {
        let mut blank = scraped();
        blank.activity_type = "  ".into();
        blank.contact_number = 0;

        let opportunity = Opportunity::from_scraped(url(), blank);

        assert_eq!(opportunity.title, UNTITLED);
        assert_eq!(opportunity.activity_type, None);
        assert_eq!(opportunity.contact_phone, None);
    }
}
