use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Learner proficiency level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// ISO 639-1 code of a practice language offered by the trainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    De,
    En,
    Es,
    Fr,
    It,
    Pt,
    Ja,
    Ko,
    Zh,
}

impl LanguageCode {
    /// The TTS locale spoken for this practice language
    pub fn locale(self) -> Locale {
        match self {
            LanguageCode::De => Locale::DeDe,
            LanguageCode::En => Locale::EnUs,
            LanguageCode::Es => Locale::EsEs,
            LanguageCode::Fr => Locale::FrFr,
            LanguageCode::It => Locale::ItIt,
            LanguageCode::Pt => Locale::PtPt,
            LanguageCode::Ja => Locale::JaJp,
            LanguageCode::Ko => Locale::KoKr,
            LanguageCode::Zh => Locale::ZhCn,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageCode::De => "de",
            LanguageCode::En => "en",
            LanguageCode::Es => "es",
            LanguageCode::Fr => "fr",
            LanguageCode::It => "it",
            LanguageCode::Pt => "pt",
            LanguageCode::Ja => "ja",
            LanguageCode::Ko => "ko",
            LanguageCode::Zh => "zh",
        }
    }
}

/// BCP 47 locale used for speech synthesis and the legacy global
/// language field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "es-ES")]
    EsEs,
    #[serde(rename = "fr-FR")]
    FrFr,
    #[serde(rename = "it-IT")]
    ItIt,
    #[serde(rename = "pt-PT")]
    PtPt,
    #[serde(rename = "ja-JP")]
    JaJp,
    #[serde(rename = "ko-KR")]
    KoKr,
    #[serde(rename = "zh-CN")]
    ZhCn,
}

impl Locale {
    pub fn language_code(self) -> LanguageCode {
        match self {
            Locale::DeDe => LanguageCode::De,
            Locale::EnUs => LanguageCode::En,
            Locale::EsEs => LanguageCode::Es,
            Locale::FrFr => LanguageCode::Fr,
            Locale::ItIt => LanguageCode::It,
            Locale::PtPt => LanguageCode::Pt,
            Locale::JaJp => LanguageCode::Ja,
            Locale::KoKr => LanguageCode::Ko,
            Locale::ZhCn => LanguageCode::Zh,
        }
    }
}

/// One conversation turn half, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    // Documents written by older clients carry only role and content
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-language learner progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageProfile {
    pub level: Level,
    pub xp: u64,
    pub streak: u32,
}

impl Default for LanguageProfile {
    fn default() -> Self {
        Self {
            level: Level::Beginner,
            xp: 0,
            streak: 0,
        }
    }
}

impl LanguageProfile {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

/// User-editable contact and display fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalProfile {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

impl Default for PersonalProfile {
    fn default() -> Self {
        Self {
            first_name: "Alex".to_string(),
            last_name: "Muster".to_string(),
            username: "@alex_lernt".to_string(),
            email: "alex@example.com".to_string(),
            phone: String::new(),
            password: String::new(),
        }
    }
}

/// Partial update for [`PersonalProfile`]; unset fields keep their
/// current value
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeFocus {
    #[default]
    Conversation,
    Vocab,
    Grammar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalIntensity {
    Casual,
    #[default]
    Balanced,
    Intense,
}

/// App settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub push_notifications: bool,
    pub daily_reminder: bool,
    pub weekly_summary: bool,
    pub sound_effects: bool,
    pub reminder_time: String,
    pub practice_focus: PracticeFocus,
    pub goal_intensity: GoalIntensity,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            push_notifications: true,
            daily_reminder: true,
            weekly_summary: false,
            sound_effects: true,
            reminder_time: "18:00".to_string(),
            practice_focus: PracticeFocus::Conversation,
            goal_intensity: GoalIntensity::Balanced,
        }
    }
}

/// Partial update for [`Preferences`]
#[derive(Debug, Clone, Default)]
pub struct PreferencesPatch {
    pub push_notifications: Option<bool>,
    pub daily_reminder: Option<bool>,
    pub weekly_summary: Option<bool>,
    pub sound_effects: Option<bool>,
    pub reminder_time: Option<String>,
    pub practice_focus: Option<PracticeFocus>,
    pub goal_intensity: Option<GoalIntensity>,
}

/// Boolean preference keys that can be flipped from the settings UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolPreference {
    PushNotifications,
    DailyReminder,
    WeeklySummary,
    SoundEffects,
}

/// XP needed to fill one level ring on the results display
pub const XP_PER_LEVEL: u64 = 240;

/// The one-shot summary produced when a session is finalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReward {
    pub lang: LanguageCode,
    pub xp_before: u64,
    pub xp_after: u64,
    pub xp_earned: u64,
    pub streak_before: u32,
    pub streak_after: u32,
    #[serde(rename = "sessionLengthSec")]
    pub session_length_secs: u64,
    pub user_turns: u32,
    pub assistant_turns: u32,
    // Stored as epoch milliseconds, matching existing documents
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub completed_at: DateTime<Utc>,
    pub level: Level,
    pub user: String,
}

/// Position inside the current level ring after a reward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub fraction: f32,
    pub xp_into_current: u64,
    pub xp_to_next: u64,
}

impl SessionReward {
    /// Progress towards the next level ring based on the post-session XP
    pub fn level_progress(&self) -> LevelProgress {
        let xp_into_current = self.xp_after % XP_PER_LEVEL;
        let fraction = (xp_into_current as f32 / XP_PER_LEVEL as f32).min(1.0);
        let xp_to_next = if xp_into_current == 0 {
            XP_PER_LEVEL
        } else {
            XP_PER_LEVEL - xp_into_current
        };
        LevelProgress {
            fraction,
            xp_into_current,
            xp_to_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_code_locale_mapping_is_total_and_invertible() {
        let codes = [
            LanguageCode::De,
            LanguageCode::En,
            LanguageCode::Es,
            LanguageCode::Fr,
            LanguageCode::It,
            LanguageCode::Pt,
            LanguageCode::Ja,
            LanguageCode::Ko,
            LanguageCode::Zh,
        ];
        for code in codes {
            assert_eq!(code.locale().language_code(), code);
        }
    }

    #[test]
    fn wire_names_match_persisted_shape() {
        let msg = Message::new(Role::Assistant, "Hallo!");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "Hallo!");

        let locale = serde_json::to_value(Locale::JaJp).unwrap();
        assert_eq!(locale, "ja-JP");

        let level = serde_json::to_value(Level::Intermediate).unwrap();
        assert_eq!(level, "intermediate");
    }

    #[test]
    fn level_progress_wraps_at_ring_boundary() {
        let mut reward = SessionReward {
            lang: LanguageCode::De,
            xp_before: 0,
            xp_after: 300,
            xp_earned: 300,
            streak_before: 0,
            streak_after: 1,
            session_length_secs: 60,
            user_turns: 1,
            assistant_turns: 1,
            completed_at: Utc::now(),
            level: Level::Beginner,
            user: "You".to_string(),
        };
        let progress = reward.level_progress();
        assert_eq!(progress.xp_into_current, 60);
        assert_eq!(progress.xp_to_next, 180);

        reward.xp_after = 480;
        let progress = reward.level_progress();
        assert_eq!(progress.xp_into_current, 0);
        assert_eq!(progress.xp_to_next, XP_PER_LEVEL);
        assert_eq!(progress.fraction, 0.0);
    }
}
