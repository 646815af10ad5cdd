use anilog_core::clock::FixedClock;
use anilog_core::db::establish_connection;
use anilog_core::error::CoreError;
use anilog_core::models::*;
use anilog_core::reminder::{IcsCalendarProvider, MemoryReminderProvider};
use anilog_core::repository::{
    ReminderRepository, SqliteRepository, TitleRepository, WorklistRepository,
};
use anilog_core::schedule::{lifecycle_state, BroadcastCalendar};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

struct TestEnv {
    repo: SqliteRepository,
    clock: Arc<FixedClock>,
    provider: Arc<MemoryReminderProvider>,
    _temp_dir: TempDir,
}

/// Wednesday noon; the week runs Monday 2024-04-01 through Sunday 2024-04-07.
fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 3, 12, 0, 0).unwrap()
}

/// Helper function to create a test database
async fn setup_test_db() -> TestEnv {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    let clock = Arc::new(FixedClock::new(start()));
    let provider = Arc::new(MemoryReminderProvider::new());
    let repo = SqliteRepository::new(pool, BroadcastCalendar::utc(), provider.clone())
        .with_clock(clock.clone());

    TestEnv {
        repo,
        clock,
        provider,
        _temp_dir: temp_dir,
    }
}

fn title_data(name: &str, first_episode_at: DateTime<Utc>, total: i64, current: i64) -> TitleData {
    TitleData {
        name: name.to_string(),
        cover: format!("https://example.com/{}.png", name.to_lowercase().replace(' ', "-")),
        total_episodes: total,
        current_episode: current,
        first_episode_at,
    }
}

async fn worklist_ids(repo: &SqliteRepository) -> (HashSet<Uuid>, HashSet<Uuid>) {
    let airing = repo.list_airing().await.unwrap().into_iter().map(|s| s.title.id).collect();
    let upcoming = repo.list_upcoming().await.unwrap().into_iter().map(|s| s.title.id).collect();
    (airing, upcoming)
}

async fn assert_mutually_exclusive(repo: &SqliteRepository) {
    let (airing, upcoming) = worklist_ids(repo).await;
    assert!(
        airing.is_disjoint(&upcoming),
        "titles in both worklists: {:?}",
        airing.intersection(&upcoming).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_finished_series_is_completed() {
    let env = setup_test_db().await;
    let first = start() - Duration::weeks(10);

    let outcome = env.repo.add_title(title_data("Bocchi the Rock", first, 8, 0)).await.unwrap();

    assert_eq!(outcome.state, LifecycleState::Completed);
    assert_eq!(outcome.reminder, ReminderStatus::NotNeeded);
    assert!(outcome.changes.is_empty());
    assert_eq!(
        env.repo.calendar().current_episode_for_airing(first, 8, start()),
        8
    );

    let (airing, upcoming) = worklist_ids(&env.repo).await;
    assert!(airing.is_empty());
    assert!(upcoming.is_empty());
    assert!(!env.repo.has_reminder(outcome.title.id).await.unwrap());
}

#[tokio::test]
async fn test_premiere_this_week_goes_to_airing() {
    let env = setup_test_db().await;
    let first = start() + Duration::days(3);

    let outcome = env.repo.add_title(title_data("Oshi no Ko", first, 11, 0)).await.unwrap();

    assert_eq!(outcome.state, LifecycleState::Upcoming);
    assert!(outcome.changes.airing_changed);
    assert!(!outcome.changes.upcoming_changed);
    assert!(outcome.changes.reminder_changed);
    assert_eq!(outcome.reminder, ReminderStatus::Bound);

    let (airing, upcoming) = worklist_ids(&env.repo).await;
    assert!(airing.contains(&outcome.title.id));
    assert!(upcoming.is_empty());
    assert!(env.repo.has_reminder(outcome.title.id).await.unwrap());
    assert_eq!(env.provider.len(), 1);
}

#[tokio::test]
async fn test_future_premiere_goes_to_upcoming_without_reminder() {
    let env = setup_test_db().await;
    let first = start() + Duration::days(12);

    let outcome = env.repo.add_title(title_data("Chainsaw Man", first, 12, 0)).await.unwrap();

    assert_eq!(outcome.state, LifecycleState::Upcoming);
    assert_eq!(outcome.reminder, ReminderStatus::NotNeeded);
    let (airing, upcoming) = worklist_ids(&env.repo).await;
    assert!(airing.is_empty());
    assert!(upcoming.contains(&outcome.title.id));
    assert!(env.provider.is_empty());
}

#[tokio::test]
async fn test_shortening_series_completes_it() {
    let env = setup_test_db().await;
    let first = start() - Duration::weeks(6);

    let added = env.repo.add_title(title_data("Vinland Saga", first, 12, 5)).await.unwrap();
    assert_eq!(added.state, LifecycleState::Airing);
    assert_eq!(added.reminder, ReminderStatus::Bound);

    let updated = env
        .repo
        .update_title(added.title.id, title_data("Vinland Saga", first, 6, 5))
        .await
        .unwrap();

    assert_eq!(updated.state, LifecycleState::Completed);
    assert_eq!(updated.reminder, ReminderStatus::NotNeeded);
    assert!(updated.changes.airing_changed);
    assert!(updated.changes.reminder_changed);

    let (airing, upcoming) = worklist_ids(&env.repo).await;
    assert!(airing.is_empty());
    assert!(upcoming.is_empty());
    assert!(!env.repo.has_reminder(added.title.id).await.unwrap());
    assert!(env.provider.is_empty());
}

#[tokio::test]
async fn test_delete_after_reminder_removed_elsewhere() {
    let env = setup_test_db().await;
    let added = env
        .repo
        .add_title(title_data("Blue Lock", start() - Duration::days(1), 24, 0))
        .await
        .unwrap();

    let (reminder_id, _) = env.provider.reminders().pop().unwrap();
    assert!(env.provider.remove_out_of_band(&reminder_id));

    let deleted = env.repo.delete_title(added.title.id).await.unwrap();
    assert!(deleted.removed);
    assert!(deleted.changes.airing_changed);
    assert!(deleted.changes.reminder_changed);

    let again = env.repo.delete_title(added.title.id).await.unwrap();
    assert_eq!(again, DeleteOutcome::default());

    assert!(matches!(
        env.repo.get_title(added.title.id).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_add_then_get_round_trip() {
    let env = setup_test_db().await;
    let first = Utc.with_ymd_and_hms(2024, 3, 20, 15, 30, 0).unwrap();

    let added = env.repo.add_title(title_data("Dandadan", first, 12, 1)).await.unwrap();
    let fetched = env.repo.get_title(added.title.id).await.unwrap();

    assert_eq!(fetched.title, added.title);
    assert_eq!(
        fetched.state,
        lifecycle_state(fetched.title.first_episode_at, fetched.last_episode_at, start())
    );
    assert_eq!(fetched.state, added.state);
    assert_eq!(fetched.last_episode_at, first + Duration::weeks(11));
    assert_eq!(fetched.weekday, chrono::Weekday::Wed);
}

#[tokio::test]
async fn test_has_reminder_heals_stale_binding() {
    let env = setup_test_db().await;
    let added = env
        .repo
        .add_title(title_data("Mob Psycho", start() - Duration::days(2), 12, 0))
        .await
        .unwrap();
    assert!(env.repo.has_reminder(added.title.id).await.unwrap());

    let (reminder_id, _) = env.provider.reminders().pop().unwrap();
    env.provider.remove_out_of_band(&reminder_id);

    assert!(!env.repo.has_reminder(added.title.id).await.unwrap());

    // The stale row is gone, so the next sweep binds a fresh reminder
    let report = env.repo.refresh_airing_worklist().await.unwrap();
    assert!(report.changes.reminder_changed);
    assert!(env.repo.has_reminder(added.title.id).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_names_are_rejected() {
    let env = setup_test_db().await;
    let first = start() + Duration::days(1);
    env.repo.add_title(title_data("Frieren", first, 28, 0)).await.unwrap();

    let err = env.repo.add_title(title_data(" Frieren ", first, 28, 0)).await.unwrap_err();
    assert!(matches!(err, CoreError::DuplicateName(name) if name == "Frieren"));

    let other = env.repo.add_title(title_data("Solo Leveling", first, 12, 0)).await.unwrap();
    let err = env
        .repo
        .update_title(other.title.id, title_data("Frieren", first, 12, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateName(_)));
    assert_eq!(env.repo.list_titles().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_titles_is_all_or_nothing() {
    let env = setup_test_db().await;
    let first = start() + Duration::days(20);

    let err = env
        .repo
        .add_titles(vec![
            title_data("Haikyuu", first, 25, 0),
            title_data("Mushishi", first, 26, 0),
            title_data("Haikyuu", first, 25, 0),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateName(_)));
    assert!(env.repo.list_titles().await.unwrap().is_empty());

    // Reminders created for airing titles before the failure are withdrawn.
    let airing_since = start() - Duration::days(2);
    let err = env
        .repo
        .add_titles(vec![
            title_data("Dandadan", airing_since, 12, 0),
            title_data("Blue Lock", airing_since, 14, 0),
            title_data("Dandadan", airing_since, 12, 0),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateName(_)));
    assert!(env.repo.list_titles().await.unwrap().is_empty());
    assert!(env.provider.is_empty());

    let outcomes = env
        .repo
        .add_titles(vec![
            title_data("Haikyuu", first, 25, 0),
            title_data("Mushishi", first, 26, 0),
        ])
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(env.repo.list_upcoming().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let env = setup_test_db().await;

    let err = env.repo.add_title(title_data("  ", start(), 12, 0)).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = env.repo.add_title(title_data("Zero", start(), 0, 0)).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = env
        .repo
        .update_title(Uuid::now_v7(), title_data("Ghost", start(), 12, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_update_without_changes_keeps_worklists() {
    let env = setup_test_db().await;
    let data = title_data("Spy Family", start() - Duration::weeks(2), 12, 2);
    let added = env.repo.add_title(data.clone()).await.unwrap();

    let updated = env.repo.update_title(added.title.id, data).await.unwrap();
    assert!(!updated.changes.airing_changed);
    assert!(!updated.changes.upcoming_changed);
    // The reminder is always reissued so it reflects the edited record
    assert!(updated.changes.reminder_changed);
    assert_eq!(env.provider.len(), 1);
}

#[tokio::test]
async fn test_upcoming_title_moves_through_its_lifecycle() {
    let env = setup_test_db().await;
    // Saturday of next week
    let first = Utc.with_ymd_and_hms(2024, 4, 13, 12, 0, 0).unwrap();
    let added = env.repo.add_title(title_data("Kusuriya", first, 2, 0)).await.unwrap();
    let id = added.title.id;
    assert_eq!(worklist_ids(&env.repo).await.1, HashSet::from([id]));

    // Nothing due yet
    let report = env.repo.refresh_upcoming_worklist().await.unwrap();
    assert_eq!(report.examined, 1);
    assert!(report.changes.is_empty());

    // Premiere week: moves to airing and gets a reminder
    env.clock.set(Utc.with_ymd_and_hms(2024, 4, 11, 12, 0, 0).unwrap());
    let report = env.repo.refresh_upcoming_worklist().await.unwrap();
    assert!(report.changes.airing_changed);
    assert!(report.changes.upcoming_changed);
    assert!(report.changes.reminder_changed);
    assert_eq!(report.advanced, 0);
    assert_eq!(worklist_ids(&env.repo).await.0, HashSet::from([id]));
    assert!(env.repo.has_reminder(id).await.unwrap());
    assert_mutually_exclusive(&env.repo).await;

    // Episode 1 has aired
    env.clock.set(Utc.with_ymd_and_hms(2024, 4, 14, 12, 0, 0).unwrap());
    let report = env.repo.refresh_airing_worklist().await.unwrap();
    assert_eq!(report.advanced, 1);
    assert_eq!(env.repo.get_title(id).await.unwrap().title.current_episode, 1);

    // Finale aired this week: stays on the airing list, reminder dropped
    env.clock.set(Utc.with_ymd_and_hms(2024, 4, 21, 13, 0, 0).unwrap());
    let report = env.repo.refresh_airing_worklist().await.unwrap();
    assert_eq!(report.advanced, 1);
    assert!(report.changes.reminder_changed);
    assert!(!report.changes.airing_changed);
    let summary = env.repo.get_title(id).await.unwrap();
    assert_eq!(summary.state, LifecycleState::Completed);
    assert_eq!(summary.title.current_episode, 2);
    assert_eq!(worklist_ids(&env.repo).await.0, HashSet::from([id]));
    assert!(env.provider.is_empty());

    // Next week it leaves the worklist
    env.clock.set(Utc.with_ymd_and_hms(2024, 4, 22, 0, 0, 0).unwrap());
    let report = env.repo.refresh_airing_worklist().await.unwrap();
    assert!(report.changes.airing_changed);
    let (airing, upcoming) = worklist_ids(&env.repo).await;
    assert!(airing.is_empty());
    assert!(upcoming.is_empty());
}

#[tokio::test]
async fn test_refresh_never_rewinds_progress() {
    let env = setup_test_db().await;
    let added = env
        .repo
        .add_title(title_data("One Piece", start() - Duration::weeks(2), 24, 10))
        .await
        .unwrap();

    let report = env.repo.refresh_airing_worklist().await.unwrap();
    assert_eq!(report.advanced, 0);
    assert_eq!(env.repo.get_title(added.title.id).await.unwrap().title.current_episode, 10);
}

#[tokio::test]
async fn test_upcoming_title_that_finished_unseen_is_cleared() {
    let env = setup_test_db().await;
    let first = start() + Duration::days(14);
    let added = env.repo.add_title(title_data("Made in Abyss", first, 3, 0)).await.unwrap();

    env.clock.set(first + Duration::weeks(6));
    let report = env.repo.refresh_upcoming_worklist().await.unwrap();
    assert!(report.changes.upcoming_changed);
    assert!(!report.changes.airing_changed);

    let (airing, upcoming) = worklist_ids(&env.repo).await;
    assert!(airing.is_empty());
    assert!(upcoming.is_empty());
    assert!(!env.repo.has_reminder(added.title.id).await.unwrap());
}

#[tokio::test]
async fn test_provider_failure_does_not_block_writes() {
    let env = setup_test_db().await;
    env.provider.deny_access(true);

    let added = env
        .repo
        .add_title(title_data("Jujutsu Kaisen", start() - Duration::days(1), 23, 0))
        .await
        .unwrap();
    assert_eq!(added.reminder, ReminderStatus::Failed);
    assert!(added.changes.airing_changed);
    assert!(!added.changes.reminder_changed);
    assert!(!env.repo.has_reminder(added.title.id).await.unwrap());

    let report = env.repo.refresh_airing_worklist().await.unwrap();
    assert_eq!(report.reminder_failures, 1);

    env.provider.deny_access(false);
    let report = env.repo.refresh_airing_worklist().await.unwrap();
    assert_eq!(report.reminder_failures, 0);
    assert!(env.repo.has_reminder(added.title.id).await.unwrap());
}

#[tokio::test]
async fn test_worklists_stay_exclusive_across_operations() {
    let env = setup_test_db().await;
    let titles = [
        title_data("Past", start() - Duration::weeks(30), 12, 0),
        title_data("Now", start() - Duration::weeks(1), 12, 0),
        title_data("Soon", start() + Duration::days(2), 12, 0),
        title_data("Later", start() + Duration::weeks(5), 12, 0),
    ];
    let outcomes = env.repo.add_titles(titles.to_vec()).await.unwrap();
    assert_mutually_exclusive(&env.repo).await;

    let later = &outcomes[3].title;
    env.repo
        .update_title(later.id, title_data("Later", start() - Duration::days(1), 12, 0))
        .await
        .unwrap();
    assert_mutually_exclusive(&env.repo).await;

    for weeks in 1..=20 {
        env.clock.set(start() + Duration::weeks(weeks));
        env.repo.refresh_upcoming_worklist().await.unwrap();
        env.repo.refresh_airing_worklist().await.unwrap();
        assert_mutually_exclusive(&env.repo).await;
    }
}

#[tokio::test]
async fn test_find_by_name_and_prefix() {
    let env = setup_test_db().await;
    let added = env
        .repo
        .add_title(title_data("Gintama", start() + Duration::weeks(3), 51, 0))
        .await
        .unwrap();

    let by_name = env.repo.find_title_by_name("Gintama").await.unwrap();
    assert_eq!(by_name.map(|t| t.id), Some(added.title.id));
    assert!(env.repo.find_title_by_name("gintama").await.unwrap().is_none());

    let id = added.title.id.to_string();
    let found = env.repo.find_titles_by_id_prefix(&id[..8]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, added.title.id);
}

#[tokio::test]
async fn test_ics_provider_end_to_end() {
    let temp_dir = tempfile::tempdir().unwrap();
    let pool = establish_connection(&temp_dir.path().join("ics.db").to_string_lossy())
        .await
        .unwrap();
    let calendar_dir = temp_dir.path().join("calendar");
    let provider = Arc::new(IcsCalendarProvider::new(&calendar_dir, 10));
    let repo = SqliteRepository::new(pool, BroadcastCalendar::from_name("Asia/Tokyo").unwrap(), provider)
        .with_clock(Arc::new(FixedClock::new(start())));

    let added = repo
        .add_title(title_data("Yuru Camp", start() - Duration::days(1), 12, 0))
        .await
        .unwrap();
    assert_eq!(added.reminder, ReminderStatus::Bound);
    assert_eq!(std::fs::read_dir(&calendar_dir).unwrap().count(), 1);

    repo.delete_title(added.title.id).await.unwrap();
    assert_eq!(std::fs::read_dir(&calendar_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_failed_update_keeps_existing_reminder() {
    let env = setup_test_db().await;
    let first = start() - Duration::days(2);
    let kept = env.repo.add_title(title_data("Oshi no Ko", first, 11, 0)).await.unwrap();
    env.repo.add_title(title_data("Bocchi the Rock", first, 12, 0)).await.unwrap();
    assert_eq!(env.provider.len(), 2);
    let before = env.provider.reminders();

    let err = env
        .repo
        .update_title(kept.title.id, title_data("Bocchi the Rock", first, 11, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateName(_)));

    assert_eq!(env.provider.reminders(), before);
    assert!(env.repo.has_reminder(kept.title.id).await.unwrap());
}

#[tokio::test]
async fn test_update_replaces_reminder_after_commit() {
    let env = setup_test_db().await;
    let first = start() - Duration::days(2);
    let added = env.repo.add_title(title_data("Mob Psycho", first, 12, 0)).await.unwrap();
    let old_ids: Vec<String> = env.provider.reminders().into_iter().map(|(id, _)| id).collect();
    assert_eq!(old_ids.len(), 1);

    env.repo
        .update_title(added.title.id, title_data("Mob Psycho 100", first, 12, 1))
        .await
        .unwrap();

    let reminders = env.provider.reminders();
    assert_eq!(reminders.len(), 1);
    assert!(!env.provider.contains(&old_ids[0]));
    assert_eq!(reminders[0].1.name, "Mob Psycho 100");
}

#[tokio::test]
async fn test_has_reminder_unknown_title() {
    let env = setup_test_db().await;
    let err = env.repo.has_reminder(Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}
