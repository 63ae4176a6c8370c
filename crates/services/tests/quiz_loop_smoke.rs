use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuestionDraft};
use quiz_core::time::fixed_clock;
use services::{QuizError, QuizRunnerService, SubmitOutcome};
use storage::repository::{InMemoryRepository, SessionStateRepository};

fn draft(prompt: &str, answer: &str, wrong: &str) -> QuestionDraft {
    QuestionDraft {
        prompt: prompt.to_string(),
        choices: vec![answer.to_string(), wrong.to_string()],
        answer: answer.to_string(),
    }
}

fn build_bank() -> QuestionBank {
    QuestionBank::from_drafts(vec![(
        "Math".to_string(),
        vec![
            draft("2 + 2?", "4", "5"),
            draft("3 + 3?", "6", "7"),
            draft("5 + 5?", "10", "12"),
        ],
    )])
    .unwrap()
}

fn build_runner(repo: &InMemoryRepository) -> QuizRunnerService {
    QuizRunnerService::new(fixed_clock(), Arc::new(build_bank()), Arc::new(repo.clone()))
}

#[tokio::test]
async fn quiz_loop_persists_each_intent_and_finishes() {
    let repo = InMemoryRepository::new();
    let runner = build_runner(&repo);

    let mut session = runner.start_subject("Math", false).await.unwrap();
    assert!(repo.load_snapshot().await.unwrap().is_some());

    let outcome = runner.submit_answer(&mut session, "5").await.unwrap();
    assert!(matches!(
        outcome,
        SubmitOutcome::Recorded { is_correct: false, .. }
    ));

    assert!(runner.next(&mut session).await.unwrap());
    let outcome = runner.submit_answer(&mut session, "6").await.unwrap();
    assert!(matches!(
        outcome,
        SubmitOutcome::Recorded { is_correct: true, .. }
    ));

    let stored = repo.load_snapshot().await.unwrap().unwrap();
    assert_eq!(stored.position, 1);
    assert_eq!(stored.answers.len(), 2);

    let summary = runner.finish(&mut session).await.unwrap();
    assert_eq!(summary.total_questions(), 3);
    assert_eq!(summary.answered_count(), 2);
    assert_eq!(summary.correct_count(), 1);
    assert_eq!(summary.percentage(), 33.3);

    assert!(repo.load_snapshot().await.unwrap().is_none());
}

#[tokio::test]
async fn restore_resumes_a_shuffled_session() {
    let repo = InMemoryRepository::new();
    let runner = build_runner(&repo);

    let mut session = runner.start_subject("Math", true).await.unwrap();
    let answer = session.questions()[0].answer().to_string();
    runner.submit_answer(&mut session, &answer).await.unwrap();
    runner.toggle_flag(&mut session).await.unwrap();

    let restored = runner.restore().await.unwrap().expect("prior session");
    assert_eq!(restored.to_snapshot(), session.to_snapshot());
    assert_eq!(restored.questions(), session.questions());
}

#[tokio::test]
async fn restore_without_prior_session_is_none() {
    let repo = InMemoryRepository::new();
    let runner = build_runner(&repo);
    assert!(runner.restore().await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_subject_is_rejected() {
    let repo = InMemoryRepository::new();
    let runner = build_runner(&repo);
    let err = runner.start_subject("History", false).await.unwrap_err();
    assert!(matches!(err, QuizError::UnknownSubject { .. }));
}

#[tokio::test]
async fn auto_advance_moves_to_the_next_question() {
    let repo = InMemoryRepository::new();
    let runner = build_runner(&repo);

    let mut session = runner.start_subject("Math", false).await.unwrap();
    runner.submit_answer(&mut session, "4").await.unwrap();
    assert!(session.pending_advance().is_some());

    let fired = runner.auto_advance(&mut session).await.unwrap();
    assert!(fired);
    assert_eq!(session.position(), 1);
    assert_eq!(repo.load_snapshot().await.unwrap().unwrap().position, 1);
}

#[tokio::test]
async fn navigating_away_discards_the_scheduled_advance() {
    let repo = InMemoryRepository::new();
    let runner = build_runner(&repo);

    let mut session = runner.start_subject("Math", false).await.unwrap();
    runner.submit_answer(&mut session, "4").await.unwrap();
    runner.go_to(&mut session, 2).await.unwrap();

    let fired = runner.auto_advance(&mut session).await.unwrap();
    assert!(!fired);
    assert_eq!(session.position(), 2);
}

#[tokio::test]
async fn retry_wrong_then_back_to_full() {
    let repo = InMemoryRepository::new();
    let runner = build_runner(&repo);

    let mut session = runner.start_subject("Math", false).await.unwrap();
    runner.submit_answer(&mut session, "5").await.unwrap();
    runner.next(&mut session).await.unwrap();
    runner.submit_answer(&mut session, "6").await.unwrap();

    runner.retry_wrong(&mut session).await.unwrap();
    assert_eq!(session.total_questions(), 1);
    assert_eq!(session.questions()[0].prompt(), "2 + 2?");
    assert_eq!(repo.load_snapshot().await.unwrap().unwrap().questions.len(), 1);

    runner.back_to_full(&mut session).await.unwrap();
    assert_eq!(session.total_questions(), 3);
    assert!(session.answers().is_empty());
}
