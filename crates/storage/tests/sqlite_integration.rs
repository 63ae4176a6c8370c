use std::collections::{BTreeMap, BTreeSet};

use quiz_core::model::AnswerRecord;
use quiz_core::time::fixed_now;
use storage::repository::{QuestionRecord, SessionSnapshot, SessionStateRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn build_snapshot(position: usize) -> SessionSnapshot {
    let questions = vec![
        QuestionRecord {
            prompt: "2 + 2?".to_string(),
            choices: vec!["3".to_string(), "4".to_string()],
            answer: "4".to_string(),
        },
        QuestionRecord {
            prompt: "3 + 3?".to_string(),
            choices: vec!["6".to_string(), "7".to_string()],
            answer: "6".to_string(),
        },
    ];

    let mut answers = BTreeMap::new();
    answers.insert(0, AnswerRecord::new("3", false));

    let mut choice_orders = BTreeMap::new();
    choice_orders.insert(0, vec!["4".to_string(), "3".to_string()]);

    let mut flagged = BTreeSet::new();
    flagged.insert(1);

    SessionSnapshot {
        subject: "Math".to_string(),
        shuffle_questions: true,
        questions,
        position,
        answers,
        flagged,
        choice_orders,
        started_at: fixed_now(),
    }
}

#[tokio::test]
async fn sqlite_round_trips_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_snapshot_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.load_snapshot().await.unwrap().is_none());

    let snapshot = build_snapshot(1);
    repo.save_snapshot(&snapshot).await.unwrap();

    let loaded = repo.load_snapshot().await.unwrap().expect("snapshot");
    assert_eq!(loaded, snapshot);
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_snapshot_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.save_snapshot(&build_snapshot(0)).await.unwrap();
    repo.save_snapshot(&build_snapshot(1)).await.unwrap();

    // last write wins, one row only
    let loaded = repo.load_snapshot().await.unwrap().expect("snapshot");
    assert_eq!(loaded.position, 1);
}

#[tokio::test]
async fn sqlite_clear_removes_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_snapshot_clear?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.save_snapshot(&build_snapshot(0)).await.unwrap();
    repo.clear_snapshot().await.unwrap();
    assert!(repo.load_snapshot().await.unwrap().is_none());

    repo.clear_snapshot().await.unwrap();
}

#[tokio::test]
async fn corrupt_snapshot_surfaces_serialization_error() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_snapshot_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    sqlx::query("INSERT INTO session_state (id, snapshot, saved_at) VALUES (1, ?1, ?2)")
        .bind("{not valid json")
        .bind(fixed_now())
        .execute(repo.pool())
        .await
        .unwrap();

    let err = repo.load_snapshot().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}
