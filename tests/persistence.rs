use aria::error::ErrorKind;
use aria::memory::{
    InMemoryStore, JsonFileStore, MemoryCategory, MemoryFact, MemoryPersistence, MemoryStore,
    MAX_FACTS_PER_CATEGORY,
};
use serde_json::json;

#[tokio::test]
async fn store_round_trips_through_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = JsonFileStore::new(dir.path().join("nested").join("memory.json"));

    let mut store = MemoryStore::new();
    store.add(MemoryFact::new(MemoryCategory::Preference, "I prefer tea"));
    store.add(MemoryFact::new(MemoryCategory::Summary, "Discussed 2 exchanges"));
    store.record_topic("tea or coffee");
    persistence.save(&store).await.unwrap();

    assert_eq!(persistence.try_load().await.unwrap(), store);
}

#[tokio::test]
async fn saving_twice_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = JsonFileStore::new(dir.path().join("memory.json"));

    let mut store = MemoryStore::new();
    store.add(MemoryFact::new(MemoryCategory::Goal, "run a marathon"));
    persistence.save(&store).await.unwrap();
    persistence.save(&store).await.unwrap();
    assert_eq!(persistence.load().await.count(MemoryCategory::Goal), 1);

    persistence.save(&MemoryStore::new()).await.unwrap();
    assert!(persistence.load().await.is_empty());
    assert!(!dir.path().join("memory.json.tmp").exists());
}

#[tokio::test]
async fn missing_file_is_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = JsonFileStore::new(dir.path().join("absent.json"));
    assert_eq!(persistence.try_load().await.unwrap(), MemoryStore::default());
}

#[tokio::test]
async fn malformed_file_falls_back_to_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");
    // Older files stored a flat list instead of the category mapping.
    tokio::fs::write(&path, r#"{"facts": ["likes tea", "wants a dog"]}"#)
        .await
        .unwrap();
    let persistence = JsonFileStore::new(&path);

    let err = persistence.try_load().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPersistedState);
    assert_eq!(persistence.load().await, MemoryStore::default());
}

#[tokio::test]
async fn absent_categories_default_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");
    tokio::fs::write(
        &path,
        r#"{"facts": {"goal": [{"category": "goal", "content": "ship v1", "timestamp": "2024-05-01T10:00:00Z"}]}}"#,
    )
    .await
    .unwrap();

    let store = JsonFileStore::new(&path).load().await;
    assert_eq!(store.count(MemoryCategory::Goal), 1);
    assert_eq!(store.count(MemoryCategory::Preference), 0);
    assert!(store.top_topics(5).is_empty());
}

#[tokio::test]
async fn loading_enforces_cap_and_categories() {
    let goals: Vec<_> = (0..70)
        .map(|i| {
            json!({"category": "goal", "content": format!("goal {i}"), "timestamp": "2024-05-01T10:00:00Z"})
        })
        .chain(std::iter::once(json!({
            "category": "preference",
            "content": "I prefer tea",
            "timestamp": "2024-05-01T10:00:00Z"
        })))
        .collect();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");
    tokio::fs::write(&path, json!({"facts": {"goal": goals}}).to_string())
        .await
        .unwrap();

    let store = JsonFileStore::new(&path).try_load().await.unwrap();
    assert_eq!(store.count(MemoryCategory::Goal), MAX_FACTS_PER_CATEGORY);
    assert_eq!(store.count(MemoryCategory::Preference), 1);
    let goals: Vec<_> = store.facts(MemoryCategory::Goal).map(|f| f.content.as_str()).collect();
    assert_eq!(goals.first(), Some(&"goal 20"));
    assert_eq!(goals.last(), Some(&"goal 69"));

    let in_process = InMemoryStore::with_document(tokio::fs::read_to_string(&path).await.unwrap());
    assert_eq!(in_process.load().await, store);
}
