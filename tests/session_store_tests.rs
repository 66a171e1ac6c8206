//! Session store persistence tests
//!
//! Exercises hydration and write-through against a real on-disk
//! location, plus the profile/preferences flows through the shared
//! store handle.

use sprachtrainer::session::{
    sanitize_username, BoolPreference, LanguageCode, Level, Locale, Message, PracticeFocus,
    PreferencesPatch, ProfilePatch, Role, SessionStorage, SessionStore,
};
use tempfile::TempDir;

fn storage_in(dir: &TempDir) -> SessionStorage {
    SessionStorage::at(dir.path().join("sprachtrainer.session.json"))
}

#[test]
fn state_survives_a_store_restart() {
    let dir = TempDir::new().unwrap();

    {
        let store = SessionStore::open(storage_in(&dir));
        store.set_target_lang(LanguageCode::De);
        store.set_level_for_lang(LanguageCode::De, Level::Advanced);
        store.set_display_name("Mina");
        store.append_message(
            Some(LanguageCode::De),
            Message::new(Role::User, "Wie spät ist es?"),
        );
    }

    let store = SessionStore::open(storage_in(&dir));
    let state = store.snapshot();
    assert_eq!(state.target_lang, Some(LanguageCode::De));
    assert_eq!(state.user, "Mina");
    assert_eq!(
        store.read(|s| s.profile_for(LanguageCode::De).unwrap().level),
        Level::Advanced
    );
    let history = store.history(Some(LanguageCode::De));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "Wie spät ist es?");
}

#[test]
fn corrupt_file_hydrates_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sprachtrainer.session.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = SessionStore::open(SessionStorage::at(&path));
    let state = store.snapshot();
    assert_eq!(state.target_lang, None);
    assert_eq!(state.user, "You");
    assert_eq!(state.language, Locale::JaJp);

    // The handle stays writable and heals the file on the next mutation
    store.set_target_lang(LanguageCode::Fr);
    let reopened = SessionStore::open(SessionStorage::at(&path));
    assert_eq!(reopened.snapshot().target_lang, Some(LanguageCode::Fr));
}

#[test]
fn missing_file_starts_from_defaults() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(storage_in(&dir));
    assert_eq!(store.snapshot().level, Level::Beginner);
    assert!(store.history(None).is_empty());
}

#[test]
fn reward_round_trips_through_disk() {
    use sprachtrainer::session::reward;
    use std::time::Duration;

    let dir = TempDir::new().unwrap();
    {
        let store = SessionStore::open(storage_in(&dir));
        store.set_target_lang(LanguageCode::Es);
        store.ensure_language_profile(LanguageCode::Es);
        let history = vec![
            Message::new(Role::User, "Hola"),
            Message::new(Role::Assistant, "¡Buenas!"),
        ];
        let stats = reward::summarize(Duration::from_secs(125), &history);
        store.complete_session(LanguageCode::Es, &stats);
    }

    let store = SessionStore::open(storage_in(&dir));
    let reward = store.last_reward().expect("persisted reward");
    assert_eq!(reward.lang, LanguageCode::Es);
    assert_eq!(reward.session_length_secs, 125);
    // 14 + 6 + 2 whole minutes * 8
    assert_eq!(reward.xp_earned, 36);
    assert_eq!(reward.streak_after, 1);

    // Dismissing the summary clears it on disk too
    assert!(store.take_last_reward().is_some());
    let reopened = SessionStore::open(storage_in(&dir));
    assert_eq!(reopened.last_reward(), None);
}

#[test]
fn shared_handles_observe_each_others_writes() {
    let store = SessionStore::in_memory();
    let other = store.clone();

    store.append_message(None, Message::new(Role::User, "one"));
    other.append_message(None, Message::new(Role::Assistant, "two"));

    assert_eq!(store.history(None).len(), 2);
    assert_eq!(other.user_turns(None), 1);
}

#[test]
fn profile_patch_normalizes_the_username() {
    let store = SessionStore::in_memory();
    store.update_profile(ProfilePatch {
        first_name: Some("John".into()),
        last_name: Some("Doe".into()),
        username: Some("  @@John Doe!! ".into()),
        ..Default::default()
    });

    let state = store.snapshot();
    assert_eq!(state.profile.username, "@johndoe");
    assert_eq!(state.profile.first_name, "John");
    assert_eq!(state.user, "John Doe");
}

#[test]
fn sanitize_username_edge_cases() {
    assert_eq!(sanitize_username("John Doe!!"), "@johndoe");
    assert_eq!(sanitize_username("@@@already"), "@already");
    assert_eq!(sanitize_username("under_score9"), "@under_score9");
    assert_eq!(sanitize_username("   "), "");
    assert_eq!(sanitize_username("!!!"), "");
}

#[test]
fn preferences_patch_and_toggle() {
    let store = SessionStore::in_memory();
    store.update_preferences(PreferencesPatch {
        practice_focus: Some(PracticeFocus::Grammar),
        reminder_time: Some("07:30".into()),
        ..Default::default()
    });
    store.toggle_preference(BoolPreference::WeeklySummary);
    store.toggle_preference(BoolPreference::SoundEffects);

    let prefs = store.snapshot().preferences;
    assert_eq!(prefs.practice_focus, PracticeFocus::Grammar);
    assert_eq!(prefs.reminder_time, "07:30");
    assert!(prefs.weekly_summary);
    assert!(!prefs.sound_effects);
    // untouched fields keep their defaults
    assert!(prefs.push_notifications);
}
