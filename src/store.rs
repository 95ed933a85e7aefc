//! Local state store
//!
//! `AppState` holds every synced collection in memory and is mutated through
//! explicit methods, one per user action. Mutations that earn or spend
//! points re-evaluate reward availability before returning, so the
//! `Available` status and the point balance can never be observed out of
//! step with each other.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::{
    FocusSession, Goal, Habit, Plan, Reward, RewardStatus, Task, UserProfile,
};

/// In-memory collections for the authenticated user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub plans: Vec<Plan>,
    #[serde(default)]
    pub focus_sessions: Vec<FocusSession>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub profile: UserProfile,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // --- tasks ---

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Replace a task's contents by id.
    pub fn update_task(&mut self, task: Task) -> Result<(), StoreError> {
        match self.tasks.iter().position(|t| t.id == task.id) {
            Some(i) => {
                self.tasks[i] = task;
                Ok(())
            }
            None => Err(StoreError::not_found("task", task.id)),
        }
    }

    /// Mark a task completed, crediting its reward points to the profile.
    pub fn complete_task(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::not_found("task", id))?;
        if task.completed {
            return Ok(());
        }
        task.completed = true;
        task.completed_at = Some(now);

        let earned = task.reward_points;
        self.profile.earn(earned);
        self.profile.tasks_completed += 1;
        self.refresh_reward_availability();
        Ok(())
    }

    /// Re-open a completed task. Earned points are not clawed back.
    pub fn reopen_task(&mut self, id: &str) -> Result<(), StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::not_found("task", id))?;
        task.completed = false;
        task.completed_at = None;
        Ok(())
    }

    /// Remove a task locally. The caller is responsible for issuing the
    /// dedicated remote delete; the bulk sync pass never propagates removals.
    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        let i = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(i))
    }

    // --- habits ---

    pub fn add_habit(&mut self, habit: Habit) {
        self.habits.push(habit);
    }

    /// Record a habit completion for `date`, crediting points when the date
    /// was not already recorded.
    pub fn record_habit(&mut self, id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let habit = self
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| StoreError::not_found("habit", id))?;
        if !habit.record_completion(date) {
            return Ok(false);
        }
        let earned = habit.reward_points;
        self.profile.earn(earned);
        self.refresh_reward_availability();
        Ok(true)
    }

    pub fn remove_habit(&mut self, id: &str) -> Option<Habit> {
        let i = self.habits.iter().position(|h| h.id == id)?;
        Some(self.habits.remove(i))
    }

    // --- goals ---

    pub fn add_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    /// Flip a milestone's completion flag and recompute the goal's progress
    /// and status.
    pub fn toggle_milestone(&mut self, goal_id: &str, milestone_id: &str) -> Result<(), StoreError> {
        let goal = self
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| StoreError::not_found("goal", goal_id))?;
        let milestone = goal
            .milestones
            .iter_mut()
            .find(|m| m.id == milestone_id)
            .ok_or_else(|| StoreError::not_found("milestone", milestone_id))?;
        milestone.completed = !milestone.completed;
        goal.recompute_progress();
        Ok(())
    }

    pub fn remove_goal(&mut self, id: &str) -> Option<Goal> {
        let i = self.goals.iter().position(|g| g.id == id)?;
        Some(self.goals.remove(i))
    }

    // --- plans ---

    pub fn add_plan(&mut self, plan: Plan) {
        self.plans.push(plan);
    }

    pub fn remove_plan(&mut self, id: &str) -> Option<Plan> {
        let i = self.plans.iter().position(|p| p.id == id)?;
        Some(self.plans.remove(i))
    }

    // --- focus sessions ---

    /// Start a focus session, optionally attached to a task by id (soft
    /// reference; the task is not required to exist).
    pub fn start_focus(&mut self, task_id: Option<String>, now: DateTime<Utc>) -> String {
        let session = FocusSession::start(task_id, now);
        let id = session.id.clone();
        self.focus_sessions.push(session);
        id
    }

    /// Close a focus session, crediting the duration-based reward.
    pub fn close_focus(&mut self, id: &str, now: DateTime<Utc>) -> Result<u32, StoreError> {
        let session = self
            .focus_sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::not_found("focus session", id))?;
        if session.completed {
            return Ok(session.reward_points);
        }
        session.close(now);

        let earned = session.reward_points;
        let minutes = session.duration_minutes;
        self.profile.earn(earned);
        self.profile.focus_minutes += minutes;
        self.refresh_reward_availability();
        Ok(earned)
    }

    // --- rewards ---

    pub fn add_reward(&mut self, reward: Reward) {
        self.rewards.push(reward);
        self.refresh_reward_availability();
    }

    /// Claim an available reward.
    ///
    /// The status transition, the `claimed_at` stamp, and the point
    /// deduction happen in one mutation; claiming twice is rejected.
    pub fn claim_reward(&mut self, id: &str, now: DateTime<Utc>) -> Result<u32, StoreError> {
        self.refresh_reward_availability();
        let points = self.profile.points;
        let reward = self
            .rewards
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::not_found("reward", id))?;

        match reward.status {
            RewardStatus::Claimed => Err(StoreError::RewardAlreadyClaimed(reward.id.clone())),
            RewardStatus::Locked => Err(StoreError::RewardLocked(reward.id.clone())),
            RewardStatus::Available => {
                debug_assert!(points >= reward.required_points);
                reward.status = RewardStatus::Claimed;
                reward.claimed_at = Some(now);
                let cost = reward.required_points;
                self.profile.points -= cost;
                self.refresh_reward_availability();
                Ok(cost)
            }
        }
    }

    /// A reward is `Available` iff the spendable balance covers its
    /// threshold and it has not been claimed.
    pub fn refresh_reward_availability(&mut self) {
        let points = self.profile.points;
        for reward in &mut self.rewards {
            if reward.status == RewardStatus::Claimed {
                continue;
            }
            reward.status = if points >= reward.required_points {
                RewardStatus::Available
            } else {
                RewardStatus::Locked
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Milestone, new_id};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn completing_a_task_credits_points_and_stamps_time() {
        let mut state = AppState::new();
        let mut task = Task::new("Do taxes");
        task.reward_points = 40;
        let id = task.id.clone();
        state.add_task(task);

        state.complete_task(&id, now()).unwrap();

        let task = state.task(&id).unwrap();
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(now()));
        assert_eq!(state.profile.points, 40);
        assert_eq!(state.profile.tasks_completed, 1);

        // Completing again is a no-op, no double credit.
        state.complete_task(&id, now()).unwrap();
        assert_eq!(state.profile.points, 40);
        assert_eq!(state.profile.tasks_completed, 1);
    }

    #[test]
    fn reward_unlocks_exactly_at_threshold() {
        let mut state = AppState::new();
        let reward = Reward::new("Ice cream", 50);
        let id = reward.id.clone();
        state.add_reward(reward);
        assert_eq!(state.rewards[0].status, RewardStatus::Locked);

        let mut task = Task::new("a");
        task.reward_points = 49;
        let t1 = task.id.clone();
        state.add_task(task);
        state.complete_task(&t1, now()).unwrap();
        assert_eq!(state.rewards[0].status, RewardStatus::Locked);

        let mut task = Task::new("b");
        task.reward_points = 1;
        let t2 = task.id.clone();
        state.add_task(task);
        state.complete_task(&t2, now()).unwrap();
        assert_eq!(state.rewards[0].status, RewardStatus::Available);

        let spent = state.claim_reward(&id, now()).unwrap();
        assert_eq!(spent, 50);
        assert_eq!(state.profile.points, 0);
        assert_eq!(state.rewards[0].status, RewardStatus::Claimed);
        assert!(state.rewards[0].claimed_at.is_some());
    }

    #[test]
    fn claiming_twice_is_rejected() {
        let mut state = AppState::new();
        state.profile.earn(100);
        let reward = Reward::new("Movie", 60);
        let id = reward.id.clone();
        state.add_reward(reward);

        state.claim_reward(&id, now()).unwrap();
        assert_eq!(
            state.claim_reward(&id, now()),
            Err(StoreError::RewardAlreadyClaimed(id))
        );
        // No double-spend: the balance was deducted exactly once.
        assert_eq!(state.profile.points, 40);
    }

    #[test]
    fn claiming_a_locked_reward_is_rejected() {
        let mut state = AppState::new();
        let reward = Reward::new("Weekend trip", 500);
        let id = reward.id.clone();
        state.add_reward(reward);

        assert_eq!(
            state.claim_reward(&id, now()),
            Err(StoreError::RewardLocked(id))
        );
    }

    #[test]
    fn claiming_can_relock_other_rewards() {
        let mut state = AppState::new();
        state.profile.earn(60);
        let first = Reward::new("Coffee", 50);
        let second = Reward::new("Snack", 30);
        let first_id = first.id.clone();
        state.add_reward(first);
        state.add_reward(second);
        assert_eq!(state.rewards[1].status, RewardStatus::Available);

        state.claim_reward(&first_id, now()).unwrap();

        // 10 points left, the 30-point reward locks again.
        assert_eq!(state.rewards[1].status, RewardStatus::Locked);
    }

    #[test]
    fn closing_a_focus_session_credits_minutes_and_points() {
        let mut state = AppState::new();
        let started = now();
        let id = state.start_focus(None, started);

        let earned = state
            .close_focus(&id, started + chrono::Duration::minutes(30))
            .unwrap();
        assert_eq!(earned, 6);
        assert_eq!(state.profile.focus_minutes, 30);
        assert_eq!(state.profile.points, 6);

        // Closing twice does not credit twice.
        state
            .close_focus(&id, started + chrono::Duration::minutes(45))
            .unwrap();
        assert_eq!(state.profile.focus_minutes, 30);
        assert_eq!(state.profile.points, 6);
    }

    #[test]
    fn toggling_milestones_recomputes_goal_progress() {
        let mut state = AppState::new();
        let mut goal = Goal::new("Learn piano");
        let m1 = Milestone {
            id: new_id(),
            title: "scales".to_string(),
            completed: false,
        };
        let m1_id = m1.id.clone();
        goal.milestones.push(m1);
        let goal_id = goal.id.clone();
        state.add_goal(goal);

        state.toggle_milestone(&goal_id, &m1_id).unwrap();
        assert_eq!(state.goals[0].progress, 100);

        state.toggle_milestone(&goal_id, &m1_id).unwrap();
        assert_eq!(state.goals[0].progress, 0);
    }

    #[test]
    fn habit_recording_credits_points_once_per_date() {
        let mut state = AppState::new();
        let mut habit = Habit::new("Meditate");
        habit.reward_points = 5;
        let id = habit.id.clone();
        state.add_habit(habit);

        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(state.record_habit(&id, date).unwrap());
        assert!(!state.record_habit(&id, date).unwrap());
        assert_eq!(state.profile.points, 5);
    }

    #[test]
    fn mutating_missing_entities_reports_not_found() {
        let mut state = AppState::new();
        assert!(matches!(
            state.complete_task("nope", now()),
            Err(StoreError::NotFound { kind: "task", .. })
        ));
        assert!(state.remove_task("nope").is_none());
    }
}
