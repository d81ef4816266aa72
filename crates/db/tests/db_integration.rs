//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `clubdesk_test`)
//!   `TEST_DB_PASSWORD` (default: `clubdesk_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use clubdesk_db::entities::{
    answer::{self, AnswerStatus},
    question::{self, QuestionStatus, Visibility},
    user::Role,
};
use clubdesk_db::filters::{Page, QuestionFilter, QuestionScope};
use clubdesk_db::repositories::{
    AnswerRepository, AnswerVoteRepository, CategoryRepository, QuestionRepository,
    UserRepository,
};
use clubdesk_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;

fn new_question(id: &str, user_id: &str, visibility: Visibility) -> question::ActiveModel {
    question::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(user_id.to_string()),
        title: Set("Wifi down".to_string()),
        content: Set("Cannot connect".to_string()),
        visibility: Set(visibility),
        status: Set(QuestionStatus::Open),
        attachment: Set(None),
        modified_by: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
}

fn new_answer(id: &str, question_id: &str, user_id: &str) -> answer::ActiveModel {
    answer::ActiveModel {
        id: Set(id.to_string()),
        question_id: Set(question_id.to_string()),
        user_id: Set(user_id.to_string()),
        content: Set("Restart the router".to_string()),
        status: Set(AnswerStatus::Pending),
        attachment: Set(None),
        modified_by: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_question_lifecycle() {
    let db = TestDatabase::create().await.unwrap();
    db.seed_user("author", "chess", Role::User).await.unwrap();
    db.seed_user("helper", "chess", Role::User).await.unwrap();
    db.seed_user("admin", "rowing", Role::Admin).await.unwrap();

    let conn = db.connection();
    let questions = QuestionRepository::new(Arc::clone(&conn));
    let answers = AnswerRepository::new(Arc::clone(&conn));

    let question = questions
        .create(new_question("q1", "author", Visibility::Public))
        .await
        .unwrap();
    assert_eq!(question.status, QuestionStatus::Open);

    let (answer, status) = answers
        .create(new_answer("a1", "q1", "helper"), question.status)
        .await
        .unwrap();
    assert_eq!(status, QuestionStatus::Pending);
    assert_eq!(questions.get_by_id("q1").await.unwrap().status, status);

    let (answer, status) = answers
        .set_status(answer, AnswerStatus::Official, "admin")
        .await
        .unwrap();
    assert_eq!(status, QuestionStatus::Resolved);

    let status = answers.delete(&answer, status).await.unwrap();
    assert_eq!(status, QuestionStatus::Open);
    assert_eq!(
        questions.get_by_id("q1").await.unwrap().status,
        QuestionStatus::Open
    );

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_vote_toggle_round_trip() {
    let db = TestDatabase::create().await.unwrap();
    db.seed_user("author", "chess", Role::User).await.unwrap();

    let conn = db.connection();
    let questions = QuestionRepository::new(Arc::clone(&conn));
    let answers = AnswerRepository::new(Arc::clone(&conn));
    let votes = AnswerVoteRepository::new(Arc::clone(&conn));

    questions
        .create(new_question("q1", "author", Visibility::Public))
        .await
        .unwrap();
    answers
        .create(new_answer("a1", "q1", "author"), QuestionStatus::Open)
        .await
        .unwrap();

    assert!(votes.toggle("author", "a1").await.unwrap());
    let counts = votes.count_by_answers(&["a1".to_string()]).await.unwrap();
    assert_eq!(counts.get("a1"), Some(&1));

    assert!(!votes.toggle("author", "a1").await.unwrap());
    assert!(votes.find("author", "a1").await.unwrap().is_none());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_category_filter_and_scope() {
    let db = TestDatabase::create().await.unwrap();
    db.seed_user("author", "chess", Role::User).await.unwrap();

    let conn = db.connection();
    let questions = QuestionRepository::new(Arc::clone(&conn));
    let categories = CategoryRepository::new(Arc::clone(&conn));

    questions
        .create(new_question("q1", "author", Visibility::Public))
        .await
        .unwrap();
    questions
        .create(new_question("q2", "author", Visibility::Private))
        .await
        .unwrap();

    let react = categories.get_or_create("React").await.unwrap();
    let again = categories.get_or_create("react").await.unwrap();
    assert_eq!(react.id, again.id);

    categories
        .set_question_categories("q1", &[react.id.clone()])
        .await
        .unwrap();
    categories
        .set_question_categories("q2", &[react.id.clone()])
        .await
        .unwrap();

    let filter = QuestionFilter {
        category: Some("REACT".to_string()),
        scope: QuestionScope::PublicOnly,
        ..Default::default()
    };
    let visible = questions.list(&filter, None, Page::default()).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, "q1");

    let filter = QuestionFilter {
        scope: QuestionScope::PublicOrAuthoredBy("author".to_string()),
        ..filter
    };
    let visible = questions.list(&filter, None, Page::default()).await.unwrap();
    assert_eq!(visible.len(), 2);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_first_use_of_category_shares_one_row() {
    let db = TestDatabase::create().await.unwrap();
    let categories = CategoryRepository::new(db.connection());

    let (first, second) = tokio::join!(
        categories.get_or_create("Wifi"),
        categories.get_or_create("WIFI"),
    );
    assert_eq!(first.unwrap().id, second.unwrap().id);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_club_audience_includes_foreign_admins() {
    let db = TestDatabase::create().await.unwrap();
    db.seed_user("member", "chess", Role::User).await.unwrap();
    db.seed_user("outsider", "rowing", Role::User).await.unwrap();
    db.seed_user("admin", "rowing", Role::Admin).await.unwrap();

    let users = UserRepository::new(db.connection());
    let mut ids: Vec<String> = users
        .find_club_members_or_admins("chess")
        .await
        .unwrap()
        .into_iter()
        .map(|(user, prefs)| {
            assert!(prefs.is_some());
            user.id
        })
        .collect();
    ids.sort();

    assert_eq!(ids, vec!["admin".to_string(), "member".to_string()]);

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
}
