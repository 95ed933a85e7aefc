//! Domain models for the Strive productivity app
//!
//! Uses String for IDs for maximum compatibility with the remote store;
//! timestamps are `chrono` values locally and RFC 3339 strings on the wire.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Points required per level step.
const POINTS_PER_LEVEL: u32 = 100;

/// Generate a fresh entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Priority level for tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// An ordered step inside a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// A task/todo item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reward_points: u32,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_index: Option<i32>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: None,
            category: None,
            priority: Priority::default(),
            deadline: None,
            completed: false,
            completed_at: None,
            reward_points: 0,
            subtasks: Vec::new(),
            image_url: None,
            sort_index: None,
        }
    }
}

/// How often a habit is expected to be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitFrequency {
    #[default]
    Daily,
    Weekly,
    Custom,
}

/// Perceived difficulty of a habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// A recurring habit with streak tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub frequency: HabitFrequency,
    #[serde(default = "default_target_count")]
    pub target_count: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    /// Completion dates as `YYYY-MM-DD` strings, deduplicated.
    #[serde(default)]
    pub completed_dates: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub reward_points: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
}

fn default_target_count() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Habit {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            category: None,
            frequency: HabitFrequency::default(),
            target_count: 1,
            current_streak: 0,
            longest_streak: 0,
            completed_dates: Vec::new(),
            active: true,
            reward_points: 0,
            difficulty: Difficulty::default(),
        }
    }

    /// Record a completion for `date`. Returns `false` when that date was
    /// already recorded. The streak continues when the previous day is also
    /// recorded, otherwise it restarts at 1; `longest_streak` keeps the
    /// `current_streak <= longest_streak` invariant locally (the sync layer
    /// does not enforce it).
    pub fn record_completion(&mut self, date: NaiveDate) -> bool {
        let key = date.format("%Y-%m-%d").to_string();
        if self.completed_dates.contains(&key) {
            return false;
        }

        let previous_day = (date - Duration::days(1)).format("%Y-%m-%d").to_string();
        if self.completed_dates.contains(&previous_day) {
            self.current_streak += 1;
        } else {
            self.current_streak = 1;
        }
        if self.current_streak > self.longest_streak {
            self.longest_streak = self.current_streak;
        }

        self.completed_dates.push(key);
        true
    }
}

/// Life area a goal belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Health,
    Career,
    Learning,
    Finance,
    #[default]
    Personal,
}

/// Goal lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

/// A step towards a goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// A long-running goal with milestones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: GoalCategory,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Derived from the milestone completion ratio, 0-100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub status: GoalStatus,
}

impl Goal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            category: GoalCategory::default(),
            target_date: None,
            milestones: Vec::new(),
            progress: 0,
            status: GoalStatus::default(),
        }
    }

    /// Recompute `progress` from the milestone completion ratio.
    ///
    /// Status transitions to `Completed` exactly when progress reaches 100,
    /// even for a paused goal, and a completed goal reverts to `Active`
    /// when a milestone is un-done below 100. A paused goal below 100
    /// stays paused.
    pub fn recompute_progress(&mut self) {
        let total = self.milestones.len();
        if total == 0 {
            self.progress = 0;
        } else {
            let done = self.milestones.iter().filter(|m| m.completed).count();
            self.progress = (done * 100 / total) as u8;
        }

        if self.progress == 100 && !self.milestones.is_empty() {
            self.status = GoalStatus::Completed;
        } else if self.status == GoalStatus::Completed {
            self.status = GoalStatus::Active;
        }
    }
}

/// What a plan is organized around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Habit,
    Goal,
    #[default]
    Routine,
}

/// Plan lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

/// A checklist entry inside a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// A dated plan with a checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub kind: PlanKind,
    pub starts_on: NaiveDate,
    #[serde(default)]
    pub ends_on: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
    #[serde(default)]
    pub status: PlanStatus,
}

/// A timed focus session, optionally attached to a task (soft reference,
/// no cascade).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub reward_points: u32,
}

impl FocusSession {
    pub fn start(task_id: Option<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            task_id,
            started_at,
            ended_at: None,
            duration_minutes: 0,
            completed: false,
            reward_points: 0,
        }
    }

    /// Close the session at `ended_at`, computing the duration-based reward.
    pub fn close(&mut self, ended_at: DateTime<Utc>) {
        let elapsed = (ended_at - self.started_at).num_minutes().max(0) as u32;
        self.ended_at = Some(ended_at);
        self.duration_minutes = elapsed;
        self.completed = true;
        self.reward_points = focus_reward(elapsed);
    }
}

/// Reward for a completed focus session: 1 point per full 5 minutes,
/// minimum 1.
pub fn focus_reward(duration_minutes: u32) -> u32 {
    (duration_minutes / 5).max(1)
}

/// Reward lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardStatus {
    #[default]
    Locked,
    Available,
    Claimed,
}

/// A claimable reward gated on accumulated points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    pub required_points: u32,
    #[serde(default)]
    pub status: RewardStatus,
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
}

impl Reward {
    pub fn new(title: impl Into<String>, required_points: u32) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            category: None,
            required_points,
            status: RewardStatus::Locked,
            claimed_at: None,
        }
    }
}

/// Aggregate counters for the authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default = "default_level")]
    pub level: u32,
    /// Spendable points (claiming a reward consumes from this balance).
    #[serde(default)]
    pub points: u32,
    /// Lifetime earned points; drives leveling, never decremented.
    #[serde(default)]
    pub lifetime_points: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub tasks_completed: u32,
    #[serde(default)]
    pub focus_minutes: u32,
}

fn default_level() -> u32 {
    1
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            level: 1,
            points: 0,
            lifetime_points: 0,
            current_streak: 0,
            longest_streak: 0,
            tasks_completed: 0,
            focus_minutes: 0,
        }
    }
}

impl UserProfile {
    /// Credit earned points and recompute the level.
    pub fn earn(&mut self, points: u32) {
        self.points += points;
        self.lifetime_points += points;
        self.level = self.lifetime_points / POINTS_PER_LEVEL + 1;
    }

    /// Derived: points still needed to reach the next level.
    pub fn points_to_next_level(&self) -> u32 {
        POINTS_PER_LEVEL - self.lifetime_points % POINTS_PER_LEVEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn goal_progress_half_done_stays_active() {
        let mut goal = Goal::new("Run a marathon");
        for (title, completed) in [("a", true), ("b", true), ("c", false), ("d", false)] {
            goal.milestones.push(Milestone {
                id: new_id(),
                title: title.to_string(),
                completed,
            });
        }
        goal.recompute_progress();
        assert_eq!(goal.progress, 50);
        assert_eq!(goal.status, GoalStatus::Active);
    }

    #[test]
    fn goal_completes_at_full_progress_and_reverts() {
        let mut goal = Goal::new("Ship the app");
        goal.milestones.push(Milestone {
            id: new_id(),
            title: "beta".to_string(),
            completed: true,
        });
        goal.recompute_progress();
        assert_eq!(goal.progress, 100);
        assert_eq!(goal.status, GoalStatus::Completed);

        goal.milestones[0].completed = false;
        goal.recompute_progress();
        assert_eq!(goal.progress, 0);
        assert_eq!(goal.status, GoalStatus::Active);
    }

    #[test]
    fn paused_goal_completes_at_full_progress_but_not_below() {
        let mut goal = Goal::new("Read 12 books");
        goal.status = GoalStatus::Paused;
        goal.milestones.push(Milestone {
            id: new_id(),
            title: "jan".to_string(),
            completed: false,
        });
        goal.milestones.push(Milestone {
            id: new_id(),
            title: "feb".to_string(),
            completed: true,
        });

        goal.recompute_progress();
        assert_eq!(goal.progress, 50);
        assert_eq!(goal.status, GoalStatus::Paused);

        goal.milestones[0].completed = true;
        goal.recompute_progress();
        assert_eq!(goal.progress, 100);
        assert_eq!(goal.status, GoalStatus::Completed);
    }

    #[test]
    fn goal_without_milestones_has_zero_progress() {
        let mut goal = Goal::new("Someday");
        goal.recompute_progress();
        assert_eq!(goal.progress, 0);
        assert_eq!(goal.status, GoalStatus::Active);
    }

    #[test]
    fn habit_streak_continues_on_consecutive_days() {
        let mut habit = Habit::new("Stretch");
        let day = |d: u32| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();

        assert!(habit.record_completion(day(1)));
        assert!(habit.record_completion(day(2)));
        assert!(habit.record_completion(day(3)));
        assert_eq!(habit.current_streak, 3);
        assert_eq!(habit.longest_streak, 3);

        // Gap resets the current streak but not the longest.
        assert!(habit.record_completion(day(10)));
        assert_eq!(habit.current_streak, 1);
        assert_eq!(habit.longest_streak, 3);
    }

    #[test]
    fn habit_completion_is_deduplicated_per_date() {
        let mut habit = Habit::new("Read");
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(habit.record_completion(date));
        assert!(!habit.record_completion(date));
        assert_eq!(habit.completed_dates.len(), 1);
        assert_eq!(habit.current_streak, 1);
    }

    #[test]
    fn focus_session_close_computes_duration_reward() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut session = FocusSession::start(None, start);
        session.close(start + Duration::minutes(25));

        assert!(session.completed);
        assert_eq!(session.duration_minutes, 25);
        assert_eq!(session.reward_points, 5);
    }

    #[test]
    fn short_focus_session_earns_minimum_reward() {
        assert_eq!(focus_reward(2), 1);
        assert_eq!(focus_reward(0), 1);
        assert_eq!(focus_reward(5), 1);
        assert_eq!(focus_reward(10), 2);
    }

    #[test]
    fn profile_levels_up_from_lifetime_points() {
        let mut profile = UserProfile::default();
        assert_eq!(profile.level, 1);
        assert_eq!(profile.points_to_next_level(), 100);

        profile.earn(130);
        assert_eq!(profile.level, 2);
        assert_eq!(profile.points_to_next_level(), 70);
        assert_eq!(profile.points, 130);
        assert_eq!(profile.lifetime_points, 130);
    }
}
