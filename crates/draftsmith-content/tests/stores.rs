//! Record lifecycle, JSON file store and statistics tests

use chrono::{Duration, Utc};
use draftsmith_content::{
    ContentType, GenerationFilter, GenerationRecord, GenerationStats, GenerationStatus,
    GenerationStore, JsonFileGenerationStore, NewGeneration, PersistenceError, RecordUpdate,
    StatsTimeframe,
};
use proptest::prelude::*;
use tempfile::TempDir;

fn new_generation(prompt: &str) -> NewGeneration {
    NewGeneration {
        model: "llama2".to_string(),
        content_type: ContentType::Blog,
        prompt: prompt.to_string(),
        metadata: serde_json::json!({"source": "test"}),
    }
}

fn record(
    status: GenerationStatus,
    content_type: ContentType,
    time_ms: u64,
    age_days: i64,
) -> GenerationRecord {
    let mut record = GenerationRecord::pending(
        format!("r-{}-{}", time_ms, age_days),
        "u1",
        NewGeneration {
            content_type,
            ..new_generation("p")
        },
        Utc::now() - Duration::days(age_days),
    );
    record.status = status;
    record.generation_time_ms = time_ms;
    record
}

// ============================================================================
// JSON File Store
// ============================================================================

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("generations.json");

    let id = {
        let store = JsonFileGenerationStore::open(&path).unwrap();
        let created = store.create("u1", new_generation("Write a haiku")).await.unwrap();
        store.update(&created.id, RecordUpdate::Generating).await.unwrap();
        store
            .update(
                &created.id,
                RecordUpdate::Completed {
                    content: "Autumn moonlight".to_string(),
                    generation_time_ms: 42,
                },
            )
            .await
            .unwrap();
        created.id
    };

    let reopened = JsonFileGenerationStore::open(&path).unwrap();
    let stored = reopened.get(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, GenerationStatus::Completed);
    assert_eq!(stored.generated_content.as_deref(), Some("Autumn moonlight"));
    assert_eq!(stored.generation_time_ms, 42);
    assert_eq!(stored.metadata["source"], "test");

    let listed = reopened.list("u1", &GenerationFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_file_store_rejects_update_of_terminal_record() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileGenerationStore::open(dir.path().join("g.json")).unwrap();
    let created = store.create("u1", new_generation("x")).await.unwrap();
    store
        .update(
            &created.id,
            RecordUpdate::Failed {
                error_message: "boom".to_string(),
                generation_time_ms: 1,
                partial_content: None,
            },
        )
        .await
        .unwrap();

    let err = store
        .update(&created.id, RecordUpdate::Generating)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PersistenceError::InvalidTransition {
            id: created.id.clone(),
            from: GenerationStatus::Failed,
            to: GenerationStatus::Generating,
        }
    );
}

/// Test: A create whose write fails leaves no record behind, in memory or on disk
#[tokio::test]
async fn test_file_store_failed_create_keeps_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("generations.json");
    let store = JsonFileGenerationStore::open(&path).unwrap();

    // A directory where the temporary file goes makes every write fail
    let blocker = dir.path().join("generations.json.tmp");
    std::fs::create_dir(&blocker).unwrap();

    let err = store.create("u1", new_generation("x")).await.unwrap_err();
    assert!(matches!(err, PersistenceError::Io(_)));
    assert!(store
        .list("u1", &GenerationFilter::default())
        .await
        .unwrap()
        .is_empty());
    assert!(!path.exists());

    std::fs::remove_dir(&blocker).unwrap();
    let created = store.create("u1", new_generation("y")).await.unwrap();
    let listed = store.list("u1", &GenerationFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);

    let reopened = JsonFileGenerationStore::open(&path).unwrap();
    assert_eq!(reopened.get(&created.id).await.unwrap(), Some(created));
}

/// Test: An update whose write fails leaves the stored record unchanged and can be retried
#[tokio::test]
async fn test_file_store_failed_update_keeps_previous_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("generations.json");
    let store = JsonFileGenerationStore::open(&path).unwrap();
    let created = store.create("u1", new_generation("x")).await.unwrap();

    let blocker = dir.path().join("generations.json.tmp");
    std::fs::create_dir(&blocker).unwrap();

    let completed = RecordUpdate::Completed {
        content: "done".to_string(),
        generation_time_ms: 7,
    };
    assert!(store.update(&created.id, completed.clone()).await.is_err());
    let stored = store.get(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, GenerationStatus::Pending);
    assert!(stored.generated_content.is_none());

    std::fs::remove_dir(&blocker).unwrap();
    let updated = store.update(&created.id, completed).await.unwrap();
    assert_eq!(updated.status, GenerationStatus::Completed);

    let reopened = JsonFileGenerationStore::open(&path).unwrap();
    let stored = reopened.get(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, GenerationStatus::Completed);
    assert_eq!(stored.generated_content.as_deref(), Some("done"));
}

#[test]
fn test_file_store_rejects_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("g.json");
    std::fs::write(&path, "{ not a list").unwrap();

    assert!(matches!(
        JsonFileGenerationStore::open(&path),
        Err(PersistenceError::Serialization(_))
    ));
}

#[test]
fn test_file_store_treats_empty_file_as_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("g.json");
    std::fs::write(&path, "").unwrap();
    assert!(JsonFileGenerationStore::open(&path).is_ok());
}

/// Test: Records created at the same instant list in id order on every call
#[test]
fn test_filter_orders_equal_timestamps_by_id() {
    let created_at = Utc::now();
    let records: Vec<GenerationRecord> = ["c", "a", "d", "b"]
        .iter()
        .map(|id| {
            GenerationRecord::pending(id.to_string(), "u1", new_generation("p"), created_at)
        })
        .collect();
    let older = GenerationRecord::pending(
        "0".to_string(),
        "u1",
        new_generation("p"),
        created_at - Duration::seconds(1),
    );

    let ids = |filter: &GenerationFilter, records: &[GenerationRecord]| {
        filter
            .apply(records.iter().chain(std::iter::once(&older)))
            .into_iter()
            .map(|r| r.id)
            .collect::<Vec<_>>()
    };

    let mut reversed = records.clone();
    reversed.reverse();
    assert_eq!(ids(&GenerationFilter::default(), &records), vec!["a", "b", "c", "d", "0"]);
    assert_eq!(ids(&GenerationFilter::default(), &reversed), vec!["a", "b", "c", "d", "0"]);

    let second_page = GenerationFilter {
        limit: 2,
        offset: 2,
        ..GenerationFilter::default()
    };
    assert_eq!(ids(&second_page, &reversed), vec!["c", "d"]);
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn test_stats_from_records() {
    let records = vec![
        record(GenerationStatus::Completed, ContentType::Blog, 100, 1),
        record(GenerationStatus::Failed, ContentType::Blog, 50, 2),
        record(GenerationStatus::Pending, ContentType::Social, 0, 3),
    ];
    let stats = GenerationStats::from_records(&records);

    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.average_time_ms, 50.0);
    assert_eq!(stats.content_type_breakdown[&ContentType::Blog], 2);
    assert_eq!(stats.content_type_breakdown[&ContentType::Social], 1);
    assert!((stats.success_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
}

#[test]
fn test_stats_empty() {
    let stats = GenerationStats::from_records(&Vec::<GenerationRecord>::new());
    assert_eq!(stats.total, 0);
    assert_eq!(stats.average_time_ms, 0.0);
    assert_eq!(stats.success_rate(), 0.0);
}

#[test]
fn test_timeframe_parsing_and_window() {
    assert_eq!("7d".parse::<StatsTimeframe>(), Ok(StatsTimeframe::Week));
    assert_eq!("30d".parse::<StatsTimeframe>(), Ok(StatsTimeframe::Month));
    assert_eq!("90d".parse::<StatsTimeframe>(), Ok(StatsTimeframe::Quarter));
    assert!("1y".parse::<StatsTimeframe>().is_err());

    let records = vec![
        record(GenerationStatus::Completed, ContentType::Blog, 10, 3),
        record(GenerationStatus::Completed, ContentType::Blog, 10, 20),
        record(GenerationStatus::Completed, ContentType::Blog, 10, 60),
    ];
    let filter = GenerationFilter {
        created_after: Some(StatsTimeframe::Month.since(Utc::now())),
        ..GenerationFilter::unbounded()
    };
    assert_eq!(filter.apply(&records).len(), 2);
}

#[test]
fn test_stats_serialize_breakdown_by_name() {
    let stats = GenerationStats::from_records(&[record(
        GenerationStatus::Completed,
        ContentType::Product,
        5,
        0,
    )]);
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["content_type_breakdown"]["product"], 1);
}

// ============================================================================
// Lifecycle Properties
// ============================================================================

fn update_strategy() -> impl Strategy<Value = RecordUpdate> {
    prop_oneof![
        Just(RecordUpdate::Generating),
        ("[a-z ]{0,12}", 0u64..10_000).prop_map(|(content, ms)| RecordUpdate::Completed {
            content,
            generation_time_ms: ms,
        }),
        ("[a-z ]{1,12}", 0u64..10_000, proptest::option::of("[a-z]{1,6}")).prop_map(
            |(message, ms, partial)| RecordUpdate::Failed {
                error_message: message,
                generation_time_ms: ms,
                partial_content: partial,
            }
        ),
    ]
}

proptest! {
    /// Content is present exactly when completed, an error exactly when failed, and a
    /// terminal record never changes again
    #[test]
    fn prop_lifecycle_invariants(updates in prop::collection::vec(update_strategy(), 1..8)) {
        let mut record = GenerationRecord::pending(
            "r1".to_string(),
            "u1",
            new_generation("prompt"),
            Utc::now(),
        );

        for update in updates {
            let before = record.clone();
            let was_terminal = before.status.is_terminal();
            let result = record.apply(update, Utc::now());

            if was_terminal {
                prop_assert!(result.is_err());
                prop_assert_eq!(&record, &before);
            }

            prop_assert_eq!(
                record.generated_content.is_some(),
                record.status == GenerationStatus::Completed
            );
            prop_assert_eq!(
                record.error_message.is_some(),
                record.status == GenerationStatus::Failed
            );
        }
    }
}
