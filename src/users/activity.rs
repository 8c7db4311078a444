//! Activity tracking and inactive account deletion

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time::{PointInTime, SECONDS_PER_DAY};

use super::User;

/// Thresholds for activity tracking, all in seconds unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityPolicy {
    /// Minimum gap between two stored activity updates
    pub tracking_interval_seconds: i64,

    /// Inactivity after which an account may be deleted
    pub max_inactive_seconds: i64,

    /// How long before deletion warnings start
    pub warning_window_seconds: i64,

    /// Minimum gap between two deletion warnings
    pub warning_interval_seconds: i64,

    /// Warnings sent before an account is actually deleted (count)
    pub max_deletion_warnings: u32,

    /// Failed deliveries after which the bot is considered blocked (count)
    pub blocked_threshold: u32,
}

impl Default for ActivityPolicy {
    fn default() -> Self {
        Self {
            tracking_interval_seconds: 2 * SECONDS_PER_DAY,
            max_inactive_seconds: 180 * SECONDS_PER_DAY,
            warning_window_seconds: 10 * SECONDS_PER_DAY,
            warning_interval_seconds: SECONDS_PER_DAY,
            max_deletion_warnings: 5,
            blocked_threshold: 30,
        }
    }
}

impl User {
    /// Record bot usage. Only stored when forced or when the previous record
    /// is older than the tracking interval. Returns whether anything changed.
    ///
    /// Any activity resets pending deletion warnings.
    pub fn update_activity(
        &mut self,
        at: &PointInTime,
        policy: &ActivityPolicy,
        force: bool,
    ) -> bool {
        let stale = self
            .timestamp_last_time_bot_used
            .is_none_or(|last| at.seconds_since(last) >= policy.tracking_interval_seconds);

        let warned = self.times_informed_about_upcoming_auto_account_deletion > 0;

        if !force && !stale && !warned {
            return false;
        }

        self.timestamp_last_time_bot_used = Some(at.timestamp());
        self.times_informed_about_upcoming_auto_account_deletion = 0;
        self.timestamp_last_time_warned_about_upcoming_auto_account_deletion = None;
        self.bot_blocked_counter = 0;

        debug!(user = %self.id, "updated activity");

        true
    }

    /// Last known activity; accounts without any count as inactive since the epoch.
    pub fn last_activity(&self) -> Timestamp {
        self.timestamp_last_time_bot_used
            .unwrap_or(Timestamp::UNIX_EPOCH)
    }

    /// Whether the user used the bot within the tracking interval.
    pub fn has_recently_used_bot(&self, at: &PointInTime, policy: &ActivityPolicy) -> bool {
        self.timestamp_last_time_bot_used
            .is_some_and(|last| at.seconds_since(last) < policy.tracking_interval_seconds)
    }

    /// Seconds left until the account is old enough to be deleted, never negative.
    pub fn seconds_until_account_deletion(
        &self,
        at: &PointInTime,
        policy: &ActivityPolicy,
    ) -> i64 {
        policy
            .max_inactive_seconds
            .saturating_sub(at.seconds_since(self.last_activity()))
            .max(0)
    }

    /// Inactive long enough and warned often enough.
    pub fn is_eligible_for_auto_deletion(&self, at: &PointInTime, policy: &ActivityPolicy) -> bool {
        self.seconds_until_account_deletion(at, policy) == 0
            && self.times_informed_about_upcoming_auto_account_deletion
                >= policy.max_deletion_warnings
    }

    /// Whether another deletion warning may be sent now.
    pub fn allows_deletion_warning(&self, at: &PointInTime, policy: &ActivityPolicy) -> bool {
        if self.seconds_until_account_deletion(at, policy) > policy.warning_window_seconds {
            return false;
        }

        if self.times_informed_about_upcoming_auto_account_deletion >= policy.max_deletion_warnings
        {
            return false;
        }

        self.timestamp_last_time_warned_about_upcoming_auto_account_deletion
            .is_none_or(|last| at.seconds_since(last) >= policy.warning_interval_seconds)
    }

    /// Record that a deletion warning was delivered.
    pub fn record_deletion_warning(&mut self, at: &PointInTime) {
        self.times_informed_about_upcoming_auto_account_deletion = self
            .times_informed_about_upcoming_auto_account_deletion
            .saturating_add(1);
        self.timestamp_last_time_warned_about_upcoming_auto_account_deletion = Some(at.timestamp());
    }

    /// Record a successful delivery.
    pub fn record_notification_sent(&mut self, at: &PointInTime) {
        self.timestamp_last_time_notification_sent_successfully = Some(at.timestamp());
        self.bot_blocked_counter = 0;
    }

    /// Record a delivery rejected because the user blocked the bot.
    pub fn record_bot_blocked(&mut self) {
        self.bot_blocked_counter = self.bot_blocked_counter.saturating_add(1);
    }

    /// Deliveries keep failing; the user most likely blocked the bot.
    pub fn has_probably_blocked_bot(&self, policy: &ActivityPolicy) -> bool {
        self.bot_blocked_counter >= policy.blocked_threshold
    }
}

#[cfg(test)]
mod tests {
    use jiff::tz::TimeZone;
    use testresult::TestResult;

    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn at(offset: i64) -> Result<PointInTime, jiff::Error> {
        Ok(PointInTime::new(
            Timestamp::from_second(NOW + offset)?,
            TimeZone::UTC,
        ))
    }

    #[test]
    fn activity_is_throttled_unless_forced() -> TestResult {
        let policy = ActivityPolicy::default();
        let mut user = User::new("1");

        assert!(user.update_activity(&at(0)?, &policy, false));
        assert!(!user.update_activity(&at(3_600)?, &policy, false));
        assert!(user.update_activity(&at(3_600)?, &policy, true));
        assert!(user.has_recently_used_bot(&at(3_600)?, &policy));
        assert!(user.update_activity(&at(3 * SECONDS_PER_DAY)?, &policy, false));

        Ok(())
    }

    #[test]
    fn deletion_countdown() -> TestResult {
        let policy = ActivityPolicy::default();
        let mut user = User::new("1");

        user.update_activity(&at(0)?, &policy, true);

        assert_eq!(
            user.seconds_until_account_deletion(&at(0)?, &policy),
            policy.max_inactive_seconds
        );
        assert_eq!(
            user.seconds_until_account_deletion(&at(policy.max_inactive_seconds * 2)?, &policy),
            0
        );

        Ok(())
    }

    #[test]
    fn warnings_precede_deletion() -> TestResult {
        let policy = ActivityPolicy::default();
        let mut user = User::new("1");

        user.update_activity(&at(0)?, &policy, true);

        let early = at(SECONDS_PER_DAY)?;

        assert!(!user.allows_deletion_warning(&early, &policy));

        let mut now = policy.max_inactive_seconds - policy.warning_window_seconds;

        for _ in 0..policy.max_deletion_warnings {
            let point = at(now)?;

            assert!(user.allows_deletion_warning(&point, &policy));
            assert!(!user.is_eligible_for_auto_deletion(&point, &policy));

            user.record_deletion_warning(&point);

            assert!(!user.allows_deletion_warning(&at(now + 60)?, &policy));

            now += policy.warning_interval_seconds;
        }

        let deadline = at(policy.max_inactive_seconds)?;

        assert!(!user.allows_deletion_warning(&deadline, &policy));
        assert!(user.is_eligible_for_auto_deletion(&deadline, &policy));

        assert!(user.update_activity(&deadline, &policy, false));
        assert!(!user.is_eligible_for_auto_deletion(&deadline, &policy));

        Ok(())
    }

    #[test]
    fn blocked_counter() -> TestResult {
        let policy = ActivityPolicy {
            blocked_threshold: 2,
            ..ActivityPolicy::default()
        };
        let mut user = User::new("1");

        user.record_bot_blocked();
        assert!(!user.has_probably_blocked_bot(&policy));

        user.record_bot_blocked();
        assert!(user.has_probably_blocked_bot(&policy));

        user.record_notification_sent(&at(0)?);
        assert!(!user.has_probably_blocked_bot(&policy));

        Ok(())
    }
}
