//! Pure reward math for session finalization
//!
//! Deterministic given the session clock and history; no external calls.

use super::types::{Message, Role};
use std::time::Duration;

/// Floor applied to the measured session length so instant finalization
/// does not produce degenerate rewards
pub const MIN_SESSION_SECS: u64 = 10;

/// Minimum XP handed out for any completed session
pub const MIN_XP: u64 = 20;

pub const XP_PER_USER_TURN: u64 = 14;
pub const XP_PER_ASSISTANT_TURN: u64 = 6;

/// Pacing bonus per whole minute of practice
pub const XP_PER_MINUTE: u64 = 8;

/// User-turn count at which the session progress bar is full
pub const SENTENCE_TARGET: u32 = 8;

/// Everything `complete_session` needs from a finished conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub session_length_secs: u64,
    pub user_turns: u32,
    pub assistant_turns: u32,
    pub xp_earned: u64,
}

/// Measured session length with the minimum floor applied
pub fn session_length_secs(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64().round() as u64).max(MIN_SESSION_SECS)
}

/// XP formula: turn-based score plus whole-minute pacing bonus,
/// never below [`MIN_XP`]
pub fn xp_earned(user_turns: u32, assistant_turns: u32, session_length_secs: u64) -> u64 {
    let base_score =
        u64::from(user_turns) * XP_PER_USER_TURN + u64::from(assistant_turns) * XP_PER_ASSISTANT_TURN;
    let pace_bonus = (session_length_secs / 60) * XP_PER_MINUTE;
    (base_score + pace_bonus).max(MIN_XP)
}

/// Summarize a finished session from its elapsed time and history
pub fn summarize(elapsed: Duration, history: &[Message]) -> SessionStats {
    let session_length_secs = session_length_secs(elapsed);
    let user_turns = history.iter().filter(|m| m.role == Role::User).count() as u32;
    let assistant_turns = history.iter().filter(|m| m.role == Role::Assistant).count() as u32;
    SessionStats {
        session_length_secs,
        user_turns,
        assistant_turns,
        xp_earned: xp_earned(user_turns, assistant_turns, session_length_secs),
    }
}

/// Fraction of the in-session progress bar that is filled
pub fn progress_ratio(user_turns: u32) -> f32 {
    (user_turns as f32 / SENTENCE_TARGET as f32).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(user_turns: usize, assistant_turns: usize) -> Vec<Message> {
        let mut messages = Vec::new();
        for i in 0..user_turns.max(assistant_turns) {
            if i < user_turns {
                messages.push(Message::new(Role::User, format!("frage {i}")));
            }
            if i < assistant_turns {
                messages.push(Message::new(Role::Assistant, format!("antwort {i}")));
            }
        }
        messages
    }

    #[test]
    fn xp_formula_matches_worked_example() {
        // 5 user turns, 5 assistant turns, 2 whole minutes of pacing
        assert_eq!(xp_earned(5, 5, 125), 116);
    }

    #[test]
    fn xp_has_minimum_floor() {
        assert_eq!(xp_earned(0, 0, 10), MIN_XP);
        assert_eq!(xp_earned(1, 0, 10), MIN_XP);
    }

    #[test]
    fn pacing_bonus_counts_whole_minutes_only() {
        assert_eq!(xp_earned(0, 0, 59), MIN_XP);
        assert_eq!(xp_earned(5, 5, 119), 108);
        assert_eq!(xp_earned(5, 5, 120), 116);
    }

    #[test]
    fn session_length_has_ten_second_floor() {
        assert_eq!(session_length_secs(Duration::from_secs(3)), 10);
        assert_eq!(session_length_secs(Duration::from_secs(0)), 10);
        assert_eq!(session_length_secs(Duration::from_secs(125)), 125);
    }

    #[test]
    fn session_length_rounds_to_nearest_second() {
        assert_eq!(session_length_secs(Duration::from_millis(125_499)), 125);
        assert_eq!(session_length_secs(Duration::from_millis(125_500)), 126);
    }

    #[test]
    fn summarize_counts_roles() {
        let stats = summarize(Duration::from_secs(125), &history(5, 5));
        assert_eq!(stats.user_turns, 5);
        assert_eq!(stats.assistant_turns, 5);
        assert_eq!(stats.session_length_secs, 125);
        assert_eq!(stats.xp_earned, 116);
    }

    #[test]
    fn progress_ratio_caps_at_one() {
        assert_eq!(progress_ratio(0), 0.0);
        assert_eq!(progress_ratio(4), 0.5);
        assert_eq!(progress_ratio(8), 1.0);
        assert_eq!(progress_ratio(20), 1.0);
    }
}
