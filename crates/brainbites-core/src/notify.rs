//! Notification port.
//!
//! Fire-and-forget signals to whatever surfaces user-facing notifications.
//! The engines never await or inspect a response; a failed delivery is the
//! port implementation's problem.

/// Outbound notification signals produced by the engines.
pub trait Notifier {
    /// The balance crossed a warning threshold downward.
    fn time_low(&self, minutes_remaining: u32);

    /// The balance crossed zero downward.
    fn time_depleted(&self);

    /// A correct answer landed exactly on a streak milestone.
    fn streak_milestone(&self, streak: u32);

    /// A daily goal's target was reached for the first time today.
    fn goal_completed(&self, title: &str, reward: &str);

    /// Refresh the persistent timer notification with the current balance.
    fn timer_update(&self, _available_seconds: i64, _is_negative: bool) {}

    /// Remove the persistent timer notification.
    fn clear_timer(&self) {}
}

/// No-op notifier for headless use and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn time_low(&self, _minutes_remaining: u32) {}
    fn time_depleted(&self) {}
    fn streak_milestone(&self, _streak: u32) {}
    fn goal_completed(&self, _title: &str, _reward: &str) {}
}
