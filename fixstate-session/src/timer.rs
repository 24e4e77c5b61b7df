/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session timers.
//!
//! This module tracks when a session must act on elapsed time:
//! - Sending heartbeats when nothing was sent for one interval
//! - Probing the peer when nothing was received for 1.2 intervals
//! - Giving up on an unanswered Logon or Logout
//!
//! Timers only report due [`SessionEvent`]s; the caller delivers them to the
//! current state.

use crate::event::SessionEvent;
use fixstate_core::types::Timestamp;
use std::time::{Duration, Instant};

/// Deadlines for one session.
#[derive(Debug)]
pub struct SessionTimers {
    /// Heartbeat interval; zero disables heartbeats and peer timeouts.
    interval: Duration,
    /// Time of last message sent.
    last_sent: Instant,
    /// Deadline for the next peer timeout; `None` when it lies beyond what
    /// `Instant` can represent.
    peer_deadline: Option<Instant>,
    /// Logon or logout deadline, if one is armed.
    state_deadline: Option<(Instant, SessionEvent)>,
}

impl SessionTimers {
    /// Creates timers with the specified heartbeat interval.
    #[must_use]
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_sent: now,
            peer_deadline: deadline(now, peer_timeout(interval)),
            state_deadline: None,
        }
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the heartbeat interval, e.g. to the one a counterparty asked for.
    pub fn set_interval(&mut self, interval: Duration, now: Instant) {
        self.interval = interval;
        self.peer_deadline = deadline(now, peer_timeout(interval));
    }

    /// Records that a message was sent.
    #[inline]
    pub fn on_sent(&mut self, now: Instant) {
        self.last_sent = now;
    }

    /// Records that a message was received.
    #[inline]
    pub fn on_received(&mut self, now: Instant) {
        self.peer_deadline = deadline(now, peer_timeout(self.interval));
    }

    /// Arms the logon or logout deadline, replacing any armed one.
    pub fn arm(&mut self, event: SessionEvent, at: Instant) {
        self.state_deadline = Some((at, event));
    }

    /// Arms the logon or logout deadline `after` from `now`.
    ///
    /// A deadline too far out to represent is never armed.
    pub fn arm_after(&mut self, event: SessionEvent, now: Instant, after: Duration) {
        match deadline(now, after) {
            Some(at) => self.arm(event, at),
            None => self.disarm(),
        }
    }

    /// Disarms the logon or logout deadline.
    pub fn disarm(&mut self) {
        self.state_deadline = None;
    }

    /// Returns the armed logon or logout deadline.
    #[must_use]
    pub fn armed(&self) -> Option<SessionEvent> {
        self.state_deadline.map(|(_, event)| event)
    }

    /// Returns every event due at `now`.
    ///
    /// The state deadline fires once. Heartbeat and peer timeouts re-arm
    /// themselves so they fire again only after another full period.
    pub fn poll(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut due = Vec::new();

        if let Some((at, event)) = self.state_deadline
            && now >= at
        {
            self.state_deadline = None;
            due.push(event);
        }

        if self.interval.is_zero() {
            return due;
        }

        if now.duration_since(self.last_sent) >= self.interval {
            self.last_sent = now;
            due.push(SessionEvent::NeedHeartbeat);
        }
        if let Some(at) = self.peer_deadline
            && now >= at
        {
            self.peer_deadline = deadline(now, peer_timeout(self.interval));
            due.push(SessionEvent::PeerTimeout);
        }

        due
    }

    /// Resets all timers as of `now` and disarms the state deadline.
    pub fn reset(&mut self, now: Instant) {
        self.last_sent = now;
        self.peer_deadline = deadline(now, peer_timeout(self.interval));
        self.state_deadline = None;
    }
}

fn peer_timeout(interval: Duration) -> Duration {
    interval.saturating_add(interval / 5)
}

fn deadline(now: Instant, after: Duration) -> Option<Instant> {
    now.checked_add(after)
}

/// Generates a unique TestReqID.
///
/// Uses the current timestamp in nanoseconds.
#[must_use]
pub fn generate_test_req_id() -> String {
    format!("TEST{}", Timestamp::now().as_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_due_after_interval() {
        let start = Instant::now();
        let mut timers = SessionTimers::new(Duration::from_secs(10), start);

        assert!(timers.poll(start + Duration::from_secs(5)).is_empty());
        assert_eq!(
            timers.poll(start + Duration::from_secs(10)),
            vec![SessionEvent::NeedHeartbeat]
        );
        assert!(timers.poll(start + Duration::from_secs(11)).is_empty());
    }

    #[test]
    fn test_sent_postpones_heartbeat() {
        let start = Instant::now();
        let mut timers = SessionTimers::new(Duration::from_secs(10), start);

        timers.on_sent(start + Duration::from_secs(8));
        timers.on_received(start + Duration::from_secs(8));
        assert!(timers.poll(start + Duration::from_secs(12)).is_empty());
    }

    #[test]
    fn test_peer_timeout_rearms() {
        let start = Instant::now();
        let mut timers = SessionTimers::new(Duration::from_secs(10), start);
        timers.on_sent(start + Duration::from_secs(11));

        let due = timers.poll(start + Duration::from_secs(12));
        assert_eq!(due, vec![SessionEvent::PeerTimeout]);

        timers.on_sent(start + Duration::from_secs(23));
        assert!(timers.poll(start + Duration::from_secs(23)).is_empty());
        assert_eq!(
            timers.poll(start + Duration::from_secs(24)),
            vec![SessionEvent::PeerTimeout]
        );
    }

    #[test]
    fn test_state_deadline_fires_once() {
        let start = Instant::now();
        let mut timers = SessionTimers::new(Duration::ZERO, start);
        timers.arm(SessionEvent::LogonTimeout, start + Duration::from_secs(10));
        assert_eq!(timers.armed(), Some(SessionEvent::LogonTimeout));

        assert!(timers.poll(start + Duration::from_secs(9)).is_empty());
        assert_eq!(
            timers.poll(start + Duration::from_secs(10)),
            vec![SessionEvent::LogonTimeout]
        );
        assert!(timers.poll(start + Duration::from_secs(60)).is_empty());
        assert_eq!(timers.armed(), None);
    }

    #[test]
    fn test_zero_interval_disables_heartbeats() {
        let start = Instant::now();
        let mut timers = SessionTimers::new(Duration::ZERO, start);
        assert!(timers.poll(start + Duration::from_secs(3600)).is_empty());
    }

    #[test]
    fn test_huge_interval_never_fires() {
        let start = Instant::now();
        let mut timers = SessionTimers::new(Duration::from_secs(10), start);
        timers.set_interval(Duration::from_secs(u64::MAX), start);
        timers.on_received(start);
        timers.reset(start);

        assert!(timers.poll(start + Duration::from_secs(3600)).is_empty());
    }

    #[test]
    fn test_arm_after_unrepresentable_deadline() {
        let start = Instant::now();
        let mut timers = SessionTimers::new(Duration::ZERO, start);
        timers.arm_after(SessionEvent::LogonTimeout, start, Duration::from_secs(10));
        assert_eq!(timers.armed(), Some(SessionEvent::LogonTimeout));

        timers.arm_after(SessionEvent::LogoutTimeout, start, Duration::MAX);
        assert_eq!(timers.armed(), None);
    }

    #[test]
    fn test_generate_test_req_id() {
        let id = generate_test_req_id();
        assert!(id.starts_with("TEST"));
        assert!(id.len() > 4);
    }
}
