use chrono::Utc;
use mb_store::InMemoryDocumentStore;

use super::*;

#[tokio::test]
async fn first_candidate_acquires_leadership() {
    let store = InMemoryDocumentStore::default();
    let is_leader = is_leader_this_cycle(&store, "replica-1", false, Utc::now()).await;
    assert!(is_leader);
}

#[tokio::test]
async fn second_candidate_does_not_acquire_while_first_holds_lease() {
    let store = InMemoryDocumentStore::default();
    let now = Utc::now();
    assert!(is_leader_this_cycle(&store, "replica-1", false, now).await);
    assert!(!is_leader_this_cycle(&store, "replica-2", false, now).await);
}

#[tokio::test]
async fn second_candidate_acquires_after_lease_expires() {
    let store = InMemoryDocumentStore::default();
    let now = Utc::now();
    assert!(is_leader_this_cycle(&store, "replica-1", false, now).await);

    let later = now + chrono::Duration::seconds(31);
    assert!(is_leader_this_cycle(&store, "replica-2", false, later).await);
}

#[tokio::test]
async fn skip_leader_election_always_reports_leader() {
    let store = InMemoryDocumentStore::default();
    let now = Utc::now();
    assert!(is_leader_this_cycle(&store, "replica-1", true, now).await);
    assert!(is_leader_this_cycle(&store, "replica-2", true, now).await);
}
