mod common;

use std::sync::Arc;

use aria::chat::{ChatMessage, ChatRole};
use aria::error::{ErrorKind, LLMError};
use aria::memory::{
    InMemoryStore, JsonFileStore, MemoryCategory, MemoryPersistence, SharedMemory,
    TranscriptLimits,
};
use aria::persona::PersonaConfig;
use aria::session::{Session, SessionFactory};
use common::Scripted;

fn session_with(provider: Arc<Scripted>, limits: TranscriptLimits) -> Session {
    Session::new(provider, Arc::new(PersonaConfig::default()), SharedMemory::default())
        .with_limits(limits)
}

fn question(i: usize) -> String {
    format!("question number {i}")
}

#[tokio::test]
async fn transcript_stays_within_ceiling() {
    let provider = Scripted::new();
    let mut session = session_with(provider, TranscriptLimits::new(20));
    for i in 1..=35 {
        session.submit(&question(i)).await.unwrap();
        assert!(session.transcript().len() <= 20, "after submit {i}");
    }
}

#[tokio::test]
async fn eviction_keeps_exactly_the_most_recent_turns() {
    let provider = Scripted::new();
    let mut session = session_with(provider, TranscriptLimits::new(20));
    for i in 1..=10 {
        session.submit(&question(i)).await.unwrap();
    }
    assert_eq!(session.transcript().len(), 20);

    let mut before = session.transcript().messages();
    let reply = session.submit(&question(11)).await.unwrap();
    before.push(ChatMessage::user().content(question(11)).build());
    before.push(ChatMessage::assistant().content(reply.text.clone()).build());

    assert_eq!(session.transcript().messages(), before[12..].to_vec());
    assert_eq!(session.transcript().messages()[0].content, question(7));

    let summary = reply.summary.expect("summary fact");
    assert_eq!(summary.category, MemoryCategory::Summary);
    assert_eq!(
        summary.content,
        "Discussed 6 exchanges including: question, number"
    );
    assert_eq!(
        session.memory().read().await.count(MemoryCategory::Summary),
        1
    );
}

#[tokio::test]
async fn eleven_exchanges_with_full_window_keep_exchanges_two_to_eleven() {
    let provider = Scripted::new();
    let limits = TranscriptLimits::new(20).with_retain(20);
    let mut session = session_with(provider, limits);
    for i in 1..=11 {
        session.submit(&question(i)).await.unwrap();
    }

    let turns = session.transcript().messages();
    assert_eq!(turns.len(), 20);
    let users: Vec<_> = turns
        .iter()
        .filter(|t| t.role == ChatRole::User)
        .map(|t| t.content.clone())
        .collect();
    let expected: Vec<_> = (2..=11).map(question).collect();
    assert_eq!(users, expected);
    assert_eq!(
        session.memory().read().await.count(MemoryCategory::Summary),
        1
    );
}

#[tokio::test]
async fn blank_input_is_rejected_without_side_effects() {
    let provider = Scripted::new();
    let mut session = session_with(provider.clone(), TranscriptLimits::default());
    session.submit("hello there").await.unwrap();

    for blank in ["", "   ", "\n\t"] {
        let err = session.submit(blank).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }
    assert_eq!(session.transcript().len(), 2);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn quota_failure_leaves_transcript_unchanged() {
    let provider = Scripted::new();
    let mut session = session_with(provider.clone(), TranscriptLimits::default());
    session.submit("first message").await.unwrap();
    let before = session.transcript().messages();

    provider.push(Err(LLMError::QuotaExceeded("You exceeded your current quota".into())));
    let err = session.submit("I love retries").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    assert_eq!(session.transcript().messages(), before);
    assert_eq!(
        session.memory().read().await.count(MemoryCategory::Preference),
        0
    );

    session.submit("I love retries").await.unwrap();
    let users: Vec<_> = session
        .transcript()
        .iter()
        .filter(|t| t.role == ChatRole::User)
        .map(|t| t.content.clone())
        .collect();
    assert_eq!(users, vec!["first message", "I love retries"]);
}

#[tokio::test]
async fn empty_provider_text_is_a_format_error() {
    let provider = Scripted::new();
    let mut session = session_with(provider.clone(), TranscriptLimits::default());
    provider.push(Ok("   ".into()));
    let err = session.submit("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseFormat);
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn request_is_system_then_transcript_then_user() {
    let provider = Scripted::new();
    let mut session = session_with(provider.clone(), TranscriptLimits::default());
    session.submit("I prefer short answers").await.unwrap();
    session.submit("what next?").await.unwrap();

    let requests = provider.requests();
    let last = &requests[1];
    assert_eq!(last.len(), 4);
    assert_eq!(last[0].role, ChatRole::System);
    assert!(last[0].content.contains("I prefer short answers"));
    assert_eq!(last[1].content, "I prefer short answers");
    assert_eq!(last[2].role, ChatRole::Assistant);
    assert_eq!(last[3].content, "what next?");
}

#[tokio::test]
async fn switching_model_keeps_the_conversation() {
    let first = Scripted::new();
    let second = Scripted::new();
    let mut session = session_with(first.clone(), TranscriptLimits::default());
    session.submit("I love jazz").await.unwrap();

    session.set_provider(second.clone());
    let reply = session.submit("and blues?").await.unwrap();
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    assert_eq!(reply.model, "scripted");
    assert_eq!(session.transcript().len(), 4);

    let request = &second.requests()[0];
    assert_eq!(request.len(), 4);
    assert_eq!(request[1].content, "I love jazz");
    assert_eq!(request[3].content, "and blues?");
}

#[tokio::test]
async fn system_prompt_is_stable_without_changes() {
    let provider = Scripted::new();
    let mut session = session_with(provider, TranscriptLimits::default());
    session.submit("my goal is to learn Rust").await.unwrap();
    let a = session.render_system_prompt().await;
    let b = session.render_system_prompt().await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn extraction_ignores_case() {
    let session = session_with(Scripted::new(), TranscriptLimits::default());
    let upper = session.extract_facts("I LOVE Rust");
    let lower = session.extract_facts("i love Rust");
    assert_eq!(upper.len(), lower.len());
    assert_eq!(upper[0].category, lower[0].category);
    assert_eq!(upper[0].content.to_lowercase(), lower[0].content.to_lowercase());
}

#[tokio::test]
async fn memory_is_saved_after_each_exchange() {
    let persistence = Arc::new(InMemoryStore::new());
    let mut session = session_with(Scripted::new(), TranscriptLimits::default())
        .with_persistence(persistence.clone());
    session.submit("I'm working on a garden robot").await.unwrap();

    let saved = persistence.load().await;
    let projects: Vec<_> = saved
        .facts(MemoryCategory::Project)
        .map(|f| f.content.clone())
        .collect();
    assert_eq!(projects, vec!["working on a garden robot"]);
}

#[tokio::test]
async fn failed_save_does_not_fail_the_exchange() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let persistence = Arc::new(JsonFileStore::new(blocker.join("memory.json")));

    let mut session = session_with(Scripted::new(), TranscriptLimits::default())
        .with_persistence(persistence);
    let reply = session.submit("I hate flaky disks").await.unwrap();
    assert_eq!(reply.learned.len(), 1);
}

#[tokio::test]
async fn concurrent_sessions_do_not_lose_facts() {
    let factory = SessionFactory::new(Scripted::new(), PersonaConfig::default(), SharedMemory::default());
    let mut handles = Vec::new();
    for i in 0..16 {
        let mut session = factory.create();
        handles.push(tokio::spawn(async move {
            session.submit(&format!("I like option {i}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(
        factory.memory().read().await.count(MemoryCategory::Preference),
        16
    );
}

#[tokio::test]
async fn sixty_facts_leave_fifty_most_recent() {
    let session = session_with(Scripted::new(), TranscriptLimits::default());
    {
        let mut store = session.memory().write().await;
        for i in 0..60 {
            store.add(aria::memory::MemoryFact::new(MemoryCategory::Goal, format!("goal {i}")));
        }
    }
    let store = session.memory().read().await;
    let goals: Vec<_> = store.facts(MemoryCategory::Goal).map(|f| f.content.clone()).collect();
    let expected: Vec<_> = (10..60).map(|i| format!("goal {i}")).collect();
    assert_eq!(goals, expected);
}
