//! Inbound frame limits for websocket connections.
//!
//! Each connection gets a [`FrameLimiter`] made of two sliding windows: a
//! short one against bursts and a long one against sustained flooding. A
//! frame must fit in both to be accepted.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Sliding window counting events in the last `window`
#[derive(Debug)]
pub struct SlidingWindow {
    /// Times of accepted events still inside the window
    timestamps: VecDeque<Instant>,
    /// Maximum number of events allowed in the window
    max_events: usize,
    window: Duration,
}

impl SlidingWindow {
    pub fn new(max_events: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
            window,
        }
    }

    fn evict(&mut self, now: Instant) {
        while self
            .timestamps
            .front()
            .is_some_and(|ts| now.duration_since(*ts) >= self.window)
        {
            self.timestamps.pop_front();
        }
    }

    /// Whether one more event fits at `now`, without recording it
    pub fn has_room(&mut self, now: Instant) -> bool {
        self.evict(now);
        self.timestamps.len() < self.max_events
    }

    pub fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
    }

    /// Events currently inside the window
    pub fn count(&self) -> usize {
        self.timestamps.len()
    }
}

/// Which window turned a frame away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    BurstExceeded,
    SustainedExceeded,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Message sent back to the client for a rejected frame
    pub fn message(self) -> &'static str {
        match self {
            Self::Allowed => "",
            Self::BurstExceeded => "rate limit exceeded: too many messages per second",
            Self::SustainedExceeded => "rate limit exceeded: too many messages per minute",
        }
    }
}

/// Burst plus sustained limits for one connection
#[derive(Debug)]
pub struct FrameLimiter {
    burst: SlidingWindow,
    sustained: SlidingWindow,
}

impl FrameLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            burst: SlidingWindow::new(config.burst_per_second, Duration::from_secs(1)),
            sustained: SlidingWindow::new(config.sustained_per_minute, Duration::from_secs(60)),
        }
    }

    pub fn check(&mut self) -> Verdict {
        self.check_at(Instant::now())
    }

    /// Rejected frames are not counted against either window.
    pub fn check_at(&mut self, now: Instant) -> Verdict {
        if !self.burst.has_room(now) {
            return Verdict::BurstExceeded;
        }
        if !self.sustained.has_room(now) {
            return Verdict::SustainedExceeded;
        }
        self.burst.record(now);
        self.sustained.record(now);
        Verdict::Allowed
    }
}

impl Default for FrameLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
