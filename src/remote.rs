//! Remote row shapes and boundary conversions
//!
//! The hosted store exposes one table per collection, scoped by an owner
//! column, with snake_case column names and nullable fields. Conversions in
//! this module substitute defaults for missing remote values (missing reward
//! defaults to 0, missing arrays default to empty) rather than rejecting the
//! row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    ChecklistItem, Difficulty, FocusSession, Goal, GoalCategory, GoalStatus, Habit, HabitFrequency,
    Milestone, Plan, PlanKind, PlanStatus, Priority, Reward, RewardStatus, SubTask, Task,
    UserProfile,
};

/// Canonical list of remote collections that participate in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Tasks,
    Habits,
    Goals,
    Plans,
    FocusSessions,
    Rewards,
    Profile,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Tasks,
        Collection::Habits,
        Collection::Goals,
        Collection::Plans,
        Collection::FocusSessions,
        Collection::Rewards,
        Collection::Profile,
    ];

    /// Remote table name.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Habits => "habits",
            Collection::Goals => "goals",
            Collection::Plans => "plans",
            Collection::FocusSessions => "focus_sessions",
            Collection::Rewards => "rewards",
            Collection::Profile => "profiles",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

fn format_ts(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

/// Unparseable remote timestamps are treated as absent, not as errors.
fn parse_ts(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

/// `tasks` table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub reward_points: Option<u32>,
    #[serde(default)]
    pub subtasks: Option<Vec<SubTaskRow>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTaskRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl TaskRow {
    pub fn from_local(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category.clone(),
            priority: Some(task.priority),
            deadline: format_ts(task.deadline),
            is_completed: task.completed,
            completed_at: format_ts(task.completed_at),
            reward_points: Some(task.reward_points),
            subtasks: Some(
                task.subtasks
                    .iter()
                    .map(|s| SubTaskRow {
                        id: s.id.clone(),
                        title: s.title.clone(),
                        is_completed: s.completed,
                    })
                    .collect(),
            ),
            image_url: task.image_url.clone(),
            sort_index: task.sort_index,
        }
    }

    pub fn into_local(self) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            priority: self.priority.unwrap_or_default(),
            deadline: parse_ts(self.deadline),
            completed: self.is_completed,
            completed_at: parse_ts(self.completed_at),
            reward_points: self.reward_points.unwrap_or(0),
            subtasks: self
                .subtasks
                .unwrap_or_default()
                .into_iter()
                .map(|s| SubTask {
                    id: s.id,
                    title: s.title,
                    completed: s.is_completed,
                })
                .collect(),
            image_url: self.image_url,
            sort_index: self.sort_index,
        }
    }
}

/// `habits` table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub frequency: Option<HabitFrequency>,
    #[serde(default)]
    pub target_count: Option<u32>,
    #[serde(default)]
    pub current_streak: Option<u32>,
    #[serde(default)]
    pub longest_streak: Option<u32>,
    #[serde(default)]
    pub completed_dates: Option<Vec<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub reward_points: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl HabitRow {
    pub fn from_local(habit: &Habit) -> Self {
        Self {
            id: habit.id.clone(),
            title: habit.title.clone(),
            category: habit.category.clone(),
            frequency: Some(habit.frequency),
            target_count: Some(habit.target_count),
            current_streak: Some(habit.current_streak),
            longest_streak: Some(habit.longest_streak),
            completed_dates: Some(habit.completed_dates.clone()),
            is_active: Some(habit.active),
            reward_points: Some(habit.reward_points),
            difficulty: Some(habit.difficulty),
        }
    }

    pub fn into_local(self) -> Habit {
        Habit {
            id: self.id,
            title: self.title,
            category: self.category,
            frequency: self.frequency.unwrap_or_default(),
            target_count: self.target_count.unwrap_or(1),
            current_streak: self.current_streak.unwrap_or(0),
            longest_streak: self.longest_streak.unwrap_or(0),
            completed_dates: self.completed_dates.unwrap_or_default(),
            active: self.is_active.unwrap_or(true),
            reward_points: self.reward_points.unwrap_or(0),
            difficulty: self.difficulty.unwrap_or_default(),
        }
    }
}

/// `goals` table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<GoalCategory>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub milestones: Option<Vec<MilestoneRow>>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl GoalRow {
    pub fn from_local(goal: &Goal) -> Self {
        Self {
            id: goal.id.clone(),
            title: goal.title.clone(),
            category: Some(goal.category),
            target_date: goal.target_date.map(|d| d.format("%Y-%m-%d").to_string()),
            milestones: Some(
                goal.milestones
                    .iter()
                    .map(|m| MilestoneRow {
                        id: m.id.clone(),
                        title: m.title.clone(),
                        is_completed: m.completed,
                    })
                    .collect(),
            ),
            progress: Some(goal.progress),
            status: Some(goal.status),
        }
    }

    pub fn into_local(self) -> Goal {
        let mut goal = Goal {
            id: self.id,
            title: self.title,
            category: self.category.unwrap_or_default(),
            target_date: parse_date(self.target_date),
            milestones: self
                .milestones
                .unwrap_or_default()
                .into_iter()
                .map(|m| Milestone {
                    id: m.id,
                    title: m.title,
                    completed: m.is_completed,
                })
                .collect(),
            progress: self.progress.unwrap_or(0),
            status: self.status.unwrap_or_default(),
        };
        // Progress is derived locally; never trust the stored value.
        goal.recompute_progress();
        goal
    }
}

/// `plans` table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub kind: Option<PlanKind>,
    #[serde(default)]
    pub starts_on: Option<String>,
    #[serde(default)]
    pub ends_on: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<ChecklistItemRow>>,
    #[serde(default)]
    pub status: Option<PlanStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItemRow {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_done: bool,
}

impl PlanRow {
    pub fn from_local(plan: &Plan) -> Self {
        Self {
            id: plan.id.clone(),
            title: plan.title.clone(),
            kind: Some(plan.kind),
            starts_on: Some(plan.starts_on.format("%Y-%m-%d").to_string()),
            ends_on: plan.ends_on.map(|d| d.format("%Y-%m-%d").to_string()),
            items: Some(
                plan.items
                    .iter()
                    .map(|i| ChecklistItemRow {
                        id: i.id.clone(),
                        text: i.text.clone(),
                        is_done: i.done,
                    })
                    .collect(),
            ),
            status: Some(plan.status),
        }
    }

    pub fn into_local(self) -> Plan {
        Plan {
            id: self.id,
            title: self.title,
            kind: self.kind.unwrap_or_default(),
            starts_on: parse_date(self.starts_on).unwrap_or_else(|| Utc::now().date_naive()),
            ends_on: parse_date(self.ends_on),
            items: self
                .items
                .unwrap_or_default()
                .into_iter()
                .map(|i| ChecklistItem {
                    id: i.id,
                    text: i.text,
                    done: i.is_done,
                })
                .collect(),
            status: self.status.unwrap_or_default(),
        }
    }
}

/// `focus_sessions` table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSessionRow {
    pub id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub started_at: String,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub reward_points: Option<u32>,
}

impl FocusSessionRow {
    pub fn from_local(session: &FocusSession) -> Self {
        Self {
            id: session.id.clone(),
            task_id: session.task_id.clone(),
            started_at: session.started_at.to_rfc3339(),
            ended_at: format_ts(session.ended_at),
            duration_minutes: Some(session.duration_minutes),
            is_completed: session.completed,
            reward_points: Some(session.reward_points),
        }
    }

    pub fn into_local(self) -> FocusSession {
        FocusSession {
            id: self.id,
            task_id: self.task_id,
            started_at: parse_ts(Some(self.started_at)).unwrap_or_else(Utc::now),
            ended_at: parse_ts(self.ended_at),
            duration_minutes: self.duration_minutes.unwrap_or(0),
            completed: self.is_completed,
            reward_points: self.reward_points.unwrap_or(0),
        }
    }
}

/// `rewards` table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub required_points: Option<u32>,
    #[serde(default)]
    pub status: Option<RewardStatus>,
    #[serde(default)]
    pub claimed_at: Option<String>,
}

impl RewardRow {
    pub fn from_local(reward: &Reward) -> Self {
        Self {
            id: reward.id.clone(),
            title: reward.title.clone(),
            category: reward.category.clone(),
            required_points: Some(reward.required_points),
            status: Some(reward.status),
            claimed_at: format_ts(reward.claimed_at),
        }
    }

    pub fn into_local(self) -> Reward {
        Reward {
            id: self.id,
            title: self.title,
            category: self.category,
            required_points: self.required_points.unwrap_or(0),
            status: self.status.unwrap_or_default(),
            claimed_at: parse_ts(self.claimed_at),
        }
    }
}

/// `profiles` table row (one row per owner; `id` is the owner id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub lifetime_points: Option<u32>,
    #[serde(default)]
    pub current_streak: Option<u32>,
    #[serde(default)]
    pub longest_streak: Option<u32>,
    #[serde(default)]
    pub tasks_completed: Option<u32>,
    #[serde(default)]
    pub focus_minutes: Option<u32>,
}

impl ProfileRow {
    pub fn from_local(profile: &UserProfile, owner: &str) -> Self {
        Self {
            id: owner.to_string(),
            level: Some(profile.level),
            points: Some(profile.points),
            lifetime_points: Some(profile.lifetime_points),
            current_streak: Some(profile.current_streak),
            longest_streak: Some(profile.longest_streak),
            tasks_completed: Some(profile.tasks_completed),
            focus_minutes: Some(profile.focus_minutes),
        }
    }

    pub fn into_local(self) -> UserProfile {
        UserProfile {
            level: self.level.unwrap_or(1),
            points: self.points.unwrap_or(0),
            lifetime_points: self.lifetime_points.unwrap_or(0),
            current_streak: self.current_streak.unwrap_or(0),
            longest_streak: self.longest_streak.unwrap_or(0),
            tasks_completed: self.tasks_completed.unwrap_or(0),
            focus_minutes: self.focus_minutes.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn collection_table_names_match_remote_contract() {
        let actual: Vec<_> = Collection::ALL.iter().map(|c| c.table()).collect();
        assert_eq!(
            actual,
            vec![
                "tasks",
                "habits",
                "goals",
                "plans",
                "focus_sessions",
                "rewards",
                "profiles"
            ]
        );
    }

    #[test]
    fn sparse_task_row_gets_defaults() {
        // Only the non-null columns; everything else defaults.
        let row: TaskRow =
            serde_json::from_str(r#"{"id": "t1", "title": "Water the plants"}"#).unwrap();
        let task = row.into_local();

        assert_eq!(task.id, "t1");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.reward_points, 0);
        assert!(task.subtasks.is_empty());
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn task_round_trips_through_row_shape() {
        let mut task = Task::new("Write report");
        task.priority = Priority::High;
        task.reward_points = 15;
        task.completed = true;
        task.completed_at = Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        task.subtasks.push(SubTask {
            id: crate::models::new_id(),
            title: "outline".to_string(),
            completed: true,
        });

        let restored = TaskRow::from_local(&task).into_local();
        assert_eq!(restored, task);
    }

    #[test]
    fn habit_row_defaults_active_and_target() {
        let row: HabitRow = serde_json::from_str(r#"{"id": "h1", "title": "Run"}"#).unwrap();
        let habit = row.into_local();
        assert!(habit.active);
        assert_eq!(habit.target_count, 1);
        assert!(habit.completed_dates.is_empty());
    }

    #[test]
    fn goal_row_recomputes_progress_on_load() {
        // Stored progress is stale; the milestone ratio wins.
        let row: GoalRow = serde_json::from_str(
            r#"{
                "id": "g1",
                "title": "Learn Rust",
                "progress": 10,
                "milestones": [
                    {"id": "m1", "title": "ownership", "is_completed": true},
                    {"id": "m2", "title": "async", "is_completed": false}
                ]
            }"#,
        )
        .unwrap();
        let goal = row.into_local();
        assert_eq!(goal.progress, 50);
        assert_eq!(goal.status, GoalStatus::Active);
    }

    #[test]
    fn malformed_remote_timestamp_is_treated_as_absent() {
        let row: TaskRow = serde_json::from_str(
            r#"{"id": "t1", "title": "x", "completed_at": "not-a-timestamp"}"#,
        )
        .unwrap();
        assert!(row.into_local().completed_at.is_none());
    }

    #[test]
    fn unknown_remote_columns_are_ignored() {
        let row: RewardRow = serde_json::from_str(
            r#"{"id": "r1", "title": "Movie night", "required_points": 50, "owner_id": "u1"}"#,
        )
        .unwrap();
        let reward = row.into_local();
        assert_eq!(reward.required_points, 50);
        assert_eq!(reward.status, RewardStatus::Locked);
    }
}
