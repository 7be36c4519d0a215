use tierguard::{CallerIdentity, InMemoryQuotaStore, QuotaEvent, QuotaGuard, Tier};
use tierguard_jsonl::JsonlSink;
use tower_service::Service;

#[tokio::test]
async fn writes_json_lines() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("quota.jsonl");
    let mut sink = JsonlSink::new(&path);

    let event = QuotaEvent::TierChanged {
        identity: CallerIdentity::from("alice"),
        from: Tier::Authenticated,
        to: Tier::Premium,
    };
    sink.call(event).await.unwrap();

    let contents = std::fs::read_to_string(&path).expect("file");
    assert!(contents.ends_with('\n'));
    let value: serde_json::Value = serde_json::from_str(contents.trim_end()).unwrap();
    assert_eq!(value["kind"], "tier_changed");
    assert_eq!(value["identity"], "alice");
    assert_eq!(value["to"], "premium");
}

#[tokio::test]
async fn guard_events_append_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    let guard = QuotaGuard::new(InMemoryQuotaStore::new()).with_sink(JsonlSink::new(&path));

    let anon = CallerIdentity::anonymous();
    for _ in 0..4 {
        let _ = guard.api_call_with_token(&anon, "tok12345", "analyze").await;
    }

    let contents = std::fs::read_to_string(&path).expect("file");
    let kinds: Vec<String> = contents
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["kind"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["anonymous_consumed", "anonymous_consumed", "anonymous_consumed", "rejected"]
    );
    assert!(!contents.contains("tok12345"));
}
