//! Persisted session store
//!
//! Single source of truth for profiles, histories and preferences.
//! `SessionState` is a plain value with pure transition methods so tests
//! can construct isolated instances; `SessionStore` wraps it in a shared
//! handle and writes the whole state back after every mutation.

use super::persist::SessionStorage;
use super::reward::SessionStats;
use super::types::{
    BoolPreference, LanguageCode, LanguageProfile, Level, Locale, Message, PersonalProfile,
    Preferences, PreferencesPatch, ProfilePatch, Role, SessionReward,
};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-turn resolved context, computed once and threaded through the
/// turn instead of re-derived with fallbacks at each read site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnContext {
    /// History/profile scope: `Some` routes through the per-language
    /// maps, `None` through the legacy global fields
    pub scope: Option<LanguageCode>,
    /// Effective practice language sent to the chat endpoint
    pub lang: LanguageCode,
    pub level: Level,
    /// Display name used for attribution
    pub user: String,
}

/// The entire persisted session, serialized as one camelCase document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub target_lang: Option<LanguageCode>,
    pub profiles_by_lang: HashMap<LanguageCode, LanguageProfile>,
    pub history_by_lang: HashMap<LanguageCode, Vec<Message>>,
    /// Legacy global fallback, used only while no target language is set
    pub language: Locale,
    pub level: Level,
    pub history: Vec<Message>,
    pub user: String,
    pub profile: PersonalProfile,
    pub preferences: Preferences,
    pub last_reward: Option<SessionReward>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            target_lang: None,
            profiles_by_lang: HashMap::new(),
            history_by_lang: HashMap::new(),
            language: Locale::JaJp,
            level: Level::Beginner,
            history: Vec::new(),
            user: "You".to_string(),
            profile: PersonalProfile::default(),
            preferences: Preferences::default(),
            last_reward: None,
        }
    }
}

/// Normalize a username handle: whitespace and invalid characters are
/// stripped, the result is lowercased and prefixed with a single `@`.
/// Empty input stays empty.
pub fn sanitize_username(value: &str) -> String {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .skip_while(|c| *c == '@')
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if normalized.is_empty() {
        String::new()
    } else {
        format!("@{normalized}")
    }
}

impl SessionState {
    /// Set the active practice language; history is left untouched
    pub fn set_target_lang(&mut self, lang: LanguageCode) {
        self.target_lang = Some(lang);
    }

    /// Create a default profile for `lang` if one does not exist yet.
    /// Idempotent; an existing profile keeps its xp and streak.
    pub fn ensure_language_profile(&mut self, lang: LanguageCode) {
        self.profiles_by_lang.entry(lang).or_default();
    }

    pub fn set_level_for_lang(&mut self, lang: LanguageCode, level: Level) {
        self.profiles_by_lang
            .entry(lang)
            .or_insert_with(|| LanguageProfile::with_level(level))
            .level = level;
    }

    pub fn set_global_level(&mut self, level: Level) {
        self.level = level;
    }

    pub fn set_global_language(&mut self, language: Locale) {
        self.language = language;
    }

    pub fn set_display_name(&mut self, user: impl Into<String>) {
        self.user = user.into();
    }

    /// Append to the scoped history; insertion order is preserved and
    /// nothing is de-duplicated
    pub fn append_message(&mut self, scope: Option<LanguageCode>, msg: Message) {
        match scope {
            Some(lang) => self.history_by_lang.entry(lang).or_default().push(msg),
            None => self.history.push(msg),
        }
    }

    /// Clear the scoped history; profiles keep their xp and streak
    pub fn reset_history(&mut self, scope: Option<LanguageCode>) {
        match scope {
            Some(lang) => {
                self.history_by_lang.insert(lang, Vec::new());
            }
            None => self.history.clear(),
        }
    }

    pub fn history(&self, scope: Option<LanguageCode>) -> &[Message] {
        match scope {
            Some(lang) => self
                .history_by_lang
                .get(&lang)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            None => &self.history,
        }
    }

    pub fn profile_for(&self, lang: LanguageCode) -> Option<&LanguageProfile> {
        self.profiles_by_lang.get(&lang)
    }

    /// Effective language: the chosen target language, else the code of
    /// the legacy global locale
    pub fn effective_lang(&self) -> LanguageCode {
        self.target_lang
            .unwrap_or_else(|| self.language.language_code())
    }

    /// Resolve the context for one conversation turn
    pub fn resolve_context(&self) -> TurnContext {
        let scope = self.target_lang;
        let lang = self.effective_lang();
        let level = scope
            .and_then(|code| self.profiles_by_lang.get(&code))
            .map(|profile| profile.level)
            .unwrap_or(self.level);
        TurnContext {
            scope,
            lang,
            level,
            user: self.user.clone(),
        }
    }

    /// Merge personal-profile fields. The username is sanitized, and a
    /// first/last name change recomposes the default display name.
    pub fn update_profile(&mut self, patch: ProfilePatch) {
        let name_changed = patch.first_name.is_some() || patch.last_name.is_some();
        if let Some(first_name) = patch.first_name {
            self.profile.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.profile.last_name = last_name;
        }
        if let Some(username) = patch.username {
            self.profile.username = sanitize_username(&username);
        }
        if let Some(email) = patch.email {
            self.profile.email = email;
        }
        if let Some(phone) = patch.phone {
            self.profile.phone = phone;
        }
        if let Some(password) = patch.password {
            self.profile.password = password;
        }
        if name_changed {
            let full = format!("{} {}", self.profile.first_name, self.profile.last_name);
            let full = full.split_whitespace().collect::<Vec<_>>().join(" ");
            if !full.is_empty() {
                self.user = full;
            }
        }
    }

    pub fn update_preferences(&mut self, patch: PreferencesPatch) {
        if let Some(v) = patch.push_notifications {
            self.preferences.push_notifications = v;
        }
        if let Some(v) = patch.daily_reminder {
            self.preferences.daily_reminder = v;
        }
        if let Some(v) = patch.weekly_summary {
            self.preferences.weekly_summary = v;
        }
        if let Some(v) = patch.sound_effects {
            self.preferences.sound_effects = v;
        }
        if let Some(v) = patch.reminder_time {
            self.preferences.reminder_time = v;
        }
        if let Some(v) = patch.practice_focus {
            self.preferences.practice_focus = v;
        }
        if let Some(v) = patch.goal_intensity {
            self.preferences.goal_intensity = v;
        }
    }

    pub fn toggle_preference(&mut self, key: BoolPreference) {
        let slot = match key {
            BoolPreference::PushNotifications => &mut self.preferences.push_notifications,
            BoolPreference::DailyReminder => &mut self.preferences.daily_reminder,
            BoolPreference::WeeklySummary => &mut self.preferences.weekly_summary,
            BoolPreference::SoundEffects => &mut self.preferences.sound_effects,
        };
        *slot = !*slot;
    }

    /// Close out a session: credit xp, bump the streak and store the
    /// one-shot reward record. Lazily creates the language profile.
    pub fn complete_session(&mut self, lang: LanguageCode, stats: &SessionStats) -> SessionReward {
        let global_level = self.level;
        let profile = self
            .profiles_by_lang
            .entry(lang)
            .or_insert_with(|| LanguageProfile::with_level(global_level));
        let xp_before = profile.xp;
        let streak_before = profile.streak;
        profile.xp = xp_before + stats.xp_earned;
        profile.streak = (streak_before + 1).max(1);

        let reward = SessionReward {
            lang,
            xp_before,
            xp_after: profile.xp,
            xp_earned: stats.xp_earned,
            streak_before,
            streak_after: profile.streak,
            session_length_secs: stats.session_length_secs,
            user_turns: stats.user_turns,
            assistant_turns: stats.assistant_turns,
            completed_at: Utc::now(),
            level: profile.level,
            user: self.user.clone(),
        };
        self.last_reward = Some(reward.clone());
        reward
    }
}

/// Shared, persisting handle over [`SessionState`]
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    storage: Option<Arc<SessionStorage>>,
}

impl SessionStore {
    /// Store without persistence, starting from the default state
    pub fn in_memory() -> Self {
        Self::with_state(SessionState::default())
    }

    pub fn with_state(state: SessionState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            storage: None,
        }
    }

    /// Hydrate from storage; a missing or unreadable file falls back to
    /// the default state rather than failing launch
    pub fn open(storage: SessionStorage) -> Self {
        let state = match storage.load() {
            Ok(state) => {
                debug!("Hydrated session from {}", storage.path().display());
                state
            }
            Err(e) => {
                warn!("Session hydration failed, starting fresh: {e}");
                SessionState::default()
            }
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            storage: Some(Arc::new(storage)),
        }
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut state = self.state.write();
        let out = f(&mut state);
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(&state) {
                warn!("Failed to persist session: {e}");
            }
        }
        out
    }

    pub fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        f(&self.state.read())
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn set_target_lang(&self, lang: LanguageCode) {
        self.mutate(|s| s.set_target_lang(lang));
    }

    pub fn ensure_language_profile(&self, lang: LanguageCode) {
        self.mutate(|s| s.ensure_language_profile(lang));
    }

    pub fn set_level_for_lang(&self, lang: LanguageCode, level: Level) {
        self.mutate(|s| s.set_level_for_lang(lang, level));
    }

    pub fn set_global_level(&self, level: Level) {
        self.mutate(|s| s.set_global_level(level));
    }

    pub fn set_global_language(&self, language: Locale) {
        self.mutate(|s| s.set_global_language(language));
    }

    pub fn set_display_name(&self, user: impl Into<String>) {
        self.mutate(|s| s.set_display_name(user));
    }

    pub fn append_message(&self, scope: Option<LanguageCode>, msg: Message) {
        self.mutate(|s| s.append_message(scope, msg));
    }

    pub fn reset_history(&self, scope: Option<LanguageCode>) {
        self.mutate(|s| s.reset_history(scope));
    }

    pub fn history(&self, scope: Option<LanguageCode>) -> Vec<Message> {
        self.read(|s| s.history(scope).to_vec())
    }

    pub fn user_turns(&self, scope: Option<LanguageCode>) -> u32 {
        self.read(|s| {
            s.history(scope)
                .iter()
                .filter(|m| m.role == Role::User)
                .count() as u32
        })
    }

    pub fn resolve_context(&self) -> TurnContext {
        self.read(SessionState::resolve_context)
    }

    pub fn update_profile(&self, patch: ProfilePatch) {
        self.mutate(|s| s.update_profile(patch));
    }

    pub fn update_preferences(&self, patch: PreferencesPatch) {
        self.mutate(|s| s.update_preferences(patch));
    }

    pub fn toggle_preference(&self, key: BoolPreference) {
        self.mutate(|s| s.toggle_preference(key));
    }

    pub fn complete_session(&self, lang: LanguageCode, stats: &SessionStats) -> SessionReward {
        self.mutate(|s| s.complete_session(lang, stats))
    }

    pub fn last_reward(&self) -> Option<SessionReward> {
        self.read(|s| s.last_reward.clone())
    }

    /// Consume the one-shot reward for the results display
    pub fn take_last_reward(&self) -> Option<SessionReward> {
        self.mutate(|s| s.last_reward.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::reward;
    use std::time::Duration;

    #[test]
    fn append_preserves_order_per_scope() {
        let mut state = SessionState::default();
        state.append_message(Some(LanguageCode::Ja), Message::new(Role::User, "eins"));
        state.append_message(Some(LanguageCode::Ja), Message::new(Role::Assistant, "zwei"));
        state.append_message(Some(LanguageCode::De), Message::new(Role::User, "drei"));
        state.append_message(None, Message::new(Role::User, "global"));

        let ja: Vec<_> = state
            .history(Some(LanguageCode::Ja))
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(ja, vec!["eins", "zwei"]);
        assert_eq!(state.history(Some(LanguageCode::De)).len(), 1);
        assert_eq!(state.history(None).len(), 1);
    }

    #[test]
    fn reset_history_leaves_other_scopes_untouched() {
        let mut state = SessionState::default();
        state.append_message(Some(LanguageCode::Ja), Message::new(Role::User, "a"));
        state.append_message(Some(LanguageCode::De), Message::new(Role::User, "b"));
        state.set_level_for_lang(LanguageCode::Ja, Level::Advanced);
        state.complete_session(
            LanguageCode::Ja,
            &reward::summarize(Duration::from_secs(60), state.history(Some(LanguageCode::Ja))),
        );

        state.reset_history(Some(LanguageCode::Ja));

        assert!(state.history(Some(LanguageCode::Ja)).is_empty());
        assert_eq!(state.history(Some(LanguageCode::De)).len(), 1);
        // profile xp/streak survive a history reset
        let profile = state.profile_for(LanguageCode::Ja).unwrap();
        assert!(profile.xp > 0);
        assert_eq!(profile.streak, 1);
    }

    #[test]
    fn ensure_language_profile_is_idempotent() {
        let mut state = SessionState::default();
        state.ensure_language_profile(LanguageCode::Fr);
        state.profiles_by_lang.get_mut(&LanguageCode::Fr).unwrap().xp = 99;
        state.ensure_language_profile(LanguageCode::Fr);
        assert_eq!(state.profile_for(LanguageCode::Fr).unwrap().xp, 99);
    }

    #[test]
    fn set_level_creates_missing_profile() {
        let mut state = SessionState::default();
        state.set_level_for_lang(LanguageCode::Ko, Level::Intermediate);
        let profile = state.profile_for(LanguageCode::Ko).unwrap();
        assert_eq!(profile.level, Level::Intermediate);
        assert_eq!(profile.xp, 0);
    }

    #[test]
    fn username_sanitization() {
        assert_eq!(sanitize_username("John Doe!!"), "@johndoe");
        assert_eq!(sanitize_username("@@Alex_Lernt"), "@alex_lernt");
        assert_eq!(sanitize_username("  "), "");
        assert_eq!(sanitize_username("üben"), "@ben");
    }

    #[test]
    fn update_profile_recomposes_display_name() {
        let mut state = SessionState::default();
        state.update_profile(ProfilePatch {
            first_name: Some("Mia".to_string()),
            ..ProfilePatch::default()
        });
        assert_eq!(state.user, "Mia Muster");

        // non-name fields leave the display name alone
        state.update_profile(ProfilePatch {
            email: Some("mia@example.com".to_string()),
            ..ProfilePatch::default()
        });
        assert_eq!(state.user, "Mia Muster");

        // blank names keep the previous display name
        state.update_profile(ProfilePatch {
            first_name: Some(String::new()),
            last_name: Some(String::new()),
            ..ProfilePatch::default()
        });
        assert_eq!(state.user, "Mia Muster");
    }

    #[test]
    fn resolve_context_prefers_target_language() {
        let mut state = SessionState::default();
        state.set_global_level(Level::Advanced);
        let ctx = state.resolve_context();
        assert_eq!(ctx.scope, None);
        assert_eq!(ctx.lang, LanguageCode::Ja);
        assert_eq!(ctx.level, Level::Advanced);

        state.set_target_lang(LanguageCode::Es);
        // no per-language profile yet: level falls back to the global one
        assert_eq!(state.resolve_context().level, Level::Advanced);

        state.set_level_for_lang(LanguageCode::Es, Level::Beginner);
        let ctx = state.resolve_context();
        assert_eq!(ctx.scope, Some(LanguageCode::Es));
        assert_eq!(ctx.lang, LanguageCode::Es);
        assert_eq!(ctx.level, Level::Beginner);
    }

    #[test]
    fn complete_session_accumulates_and_stores_one_shot_reward() {
        let store = SessionStore::in_memory();
        store.set_target_lang(LanguageCode::De);
        let stats = SessionStats {
            session_length_secs: 125,
            user_turns: 5,
            assistant_turns: 5,
            xp_earned: 116,
        };
        let first = store.complete_session(LanguageCode::De, &stats);
        assert_eq!(first.xp_before, 0);
        assert_eq!(first.xp_after, 116);
        assert_eq!(first.streak_before, 0);
        assert_eq!(first.streak_after, 1);

        let second = store.complete_session(LanguageCode::De, &stats);
        assert_eq!(second.xp_before, 116);
        assert_eq!(second.xp_after, 232);
        assert_eq!(second.streak_after, 2);

        assert_eq!(store.last_reward(), Some(second.clone()));
        assert_eq!(store.take_last_reward(), Some(second));
        assert_eq!(store.last_reward(), None);
    }

    #[test]
    fn toggle_preference_flips_booleans() {
        let mut state = SessionState::default();
        assert!(state.preferences.push_notifications);
        state.toggle_preference(BoolPreference::PushNotifications);
        assert!(!state.preferences.push_notifications);
        state.toggle_preference(BoolPreference::WeeklySummary);
        assert!(state.preferences.weekly_summary);
    }
}
