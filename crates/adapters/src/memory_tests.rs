use mb_core::{MeetingId, OrgId, SessionId, UserId, WorkerJobParams, WorkerJobSpec};

use super::*;

struct Fixture {
    org_id: OrgId,
    session_id: SessionId,
    user_id: UserId,
    meeting_id: MeetingId,
}

impl Fixture {
    fn new() -> Self {
        Self {
            org_id: OrgId::from("org-1"),
            session_id: SessionId::from("a".repeat(64)),
            user_id: UserId::from("user-1"),
            meeting_id: MeetingId::from("meeting-1"),
        }
    }

    fn spec(&self) -> WorkerJobSpec {
        WorkerJobSpec::build(WorkerJobParams {
            org_id: &self.org_id,
            session_id: &self.session_id,
            normalized_url: "https://zoom.us/j/123",
            join_url: "https://zoom.us/j/123",
            canonical_user_id: &self.user_id,
            canonical_meeting_id: &self.meeting_id,
            namespace: "default".to_string(),
            manager_image: "manager:latest".to_string(),
            meeting_bot_image: "bot:latest".to_string(),
            service_account: None,
            display_name: "Standup".to_string(),
        })
    }
}

#[tokio::test]
async fn find_non_terminal_job_matches_by_labels_not_name() {
    let orchestrator = InMemoryOrchestrator::new();
    let spec = Fixture::new().spec();
    orchestrator.seed_running_job("some-other-name", spec.labels.clone());

    let found = orchestrator.find_non_terminal_job(&spec.namespace, &spec.labels).await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn terminal_job_is_not_returned_as_non_terminal() {
    let orchestrator = InMemoryOrchestrator::new();
    let spec = Fixture::new().spec();
    orchestrator.seed_running_job(spec.job_name.as_str(), spec.labels.clone());
    orchestrator.set_phase(spec.job_name.as_str(), JobPhase::Succeeded);

    let found = orchestrator.find_non_terminal_job(&spec.namespace, &spec.labels).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn create_job_fails_when_primed_and_does_not_register_job() {
    let orchestrator = InMemoryOrchestrator::new();
    let spec = Fixture::new().spec();
    orchestrator.fail_next_create_job("quota exceeded");

    let result = orchestrator.create_job(&spec).await;
    assert!(matches!(result, Err(OrchestratorError::ApiRejected(_))));
    assert_eq!(orchestrator.job_count(), 0);
}

#[tokio::test]
async fn create_job_then_find_non_terminal_job_round_trips() {
    let orchestrator = InMemoryOrchestrator::new();
    let spec = Fixture::new().spec();
    orchestrator.create_job(&spec).await.unwrap();

    let found = orchestrator.find_non_terminal_job(&spec.namespace, &spec.labels).await.unwrap();
    assert_eq!(found.unwrap().name, spec.job_name.to_string());
}

#[tokio::test]
async fn copy_if_absent_copies_once_then_is_a_no_op() {
    let store = InMemoryObjectStore::new();
    store.put("recordings/user-1/meeting-1/video.mp4", "bytes");

    let first = store
        .copy_if_absent("recordings/user-1/meeting-1/video.mp4", "recordings/user-2/meeting-1/video.mp4")
        .await
        .unwrap();
    let second = store
        .copy_if_absent("recordings/user-1/meeting-1/video.mp4", "recordings/user-2/meeting-1/video.mp4")
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    assert_eq!(store.blob_count_under("recordings/user-2/"), 1);
}

#[tokio::test]
async fn copy_if_absent_missing_source_errors() {
    let store = InMemoryObjectStore::new();
    let result = store.copy_if_absent("missing/src", "dst").await;
    assert!(matches!(result, Err(ObjectStoreError::NotFound(_))));
}

#[tokio::test]
async fn list_filters_by_prefix() {
    let store = InMemoryObjectStore::new();
    store.put("recordings/user-1/meeting-1/video.mp4", "a");
    store.put("recordings/user-2/meeting-1/video.mp4", "b");

    let listed = store.list("recordings/user-1/").await.unwrap();
    assert_eq!(listed, vec!["recordings/user-1/meeting-1/video.mp4".to_string()]);
}
