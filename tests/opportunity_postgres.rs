use sqlx::PgPool;
use url::Url;

use volunteer_scraper::{
    llm::VolunteerOpportunity,
    opportunities::{Opportunity, OpportunityStore, PgOpportunityStore},
};

fn scraped(organization: &str) -> VolunteerOpportunity {
    VolunteerOpportunity {
        organization_name: organization.into(),
        activity_type: "beach litter survey".into(),
        location: "Harbour Rd, Penzance".into(),
        time_slot: "Su".into(),
        slot_availability: vec!["corporate group application required".into()],
        contact_email: "beach@example.org".into(),
        contact_number: 0,
        extra: "N/A".into(),
        tags: vec!["Environment".into()],
        url: "https://example.org/beach".into(),
    }
}

fn url() -> Url {
    Url::parse("https://example.org/beach").unwrap()
}

#[sqlx::test]
async fn test_insert_and_get_by_url(pool: PgPool) {
    let store = PgOpportunityStore::new(pool);
    let candidate = Opportunity::from_scraped(url(), scraped("Coast Watch"));

    let saved = store.insert(candidate.clone()).await.expect("Failed to insert");

    assert_eq!(saved.id, candidate.id);
    let found = store
        .get_by_url(&url())
        .await
        .unwrap()
        .expect("opportunity should exist");
    assert_eq!(found.title, "Beach Litter Survey");
    assert_eq!(found.tags, vec!["environment"]);
    assert_eq!(found.description, None);
    assert_eq!(found.contact_email.as_deref(), Some("beach@example.org"));
    assert_eq!(found.raw, scraped("Coast Watch"));
}

#[sqlx::test]
async fn test_conflicting_insert_returns_existing_row(pool: PgPool) {
    let store = PgOpportunityStore::new(pool.clone());
    let first = store
        .insert(Opportunity::from_scraped(url(), scraped("Coast Watch")))
        .await
        .unwrap();

    let second = store
        .insert(Opportunity::from_scraped(url(), scraped("Somebody Else")))
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.organization, "Coast Watch");
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM opportunities")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[sqlx::test]
async fn test_unknown_url_is_none(pool: PgPool) {
    let store = PgOpportunityStore::new(pool);

    assert!(store.get_by_url(&url()).await.unwrap().is_none());
}
