//! Global dispatch cooldown.

use chrono::{DateTime, TimeDelta, Utc};

/// Result of asking the gate for a dispatch slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Ready,
    Blocked(TimeDelta),
}

/// Tracks the last successful dispatch. One gate serves every requester.
#[derive(Debug, Clone, Default)]
pub struct CooldownGate {
    last: Option<DateTime<Utc>>,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    /// Take the slot if `interval` has passed since the last dispatch.
    ///
    /// `Blocked` leaves the gate unchanged.
    pub fn try_acquire(&mut self, now: DateTime<Utc>, interval: TimeDelta) -> Gate {
        if let Some(last) = self.last {
            let elapsed = now - last;
            if elapsed < interval {
                return Gate::Blocked(interval - elapsed);
            }
        }
        self.last = Some(now);
        Gate::Ready
    }

    /// Undo an acquisition whose dispatch did not go through.
    pub fn restore(&mut self, last: Option<DateTime<Utc>>) {
        self.last = last;
    }
}

/// Grammatical number of a counted noun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plural {
    One,
    Few,
    Many,
}

/// Russian plural category: 1, 21, 101 → One; 2-4, 22-24 → Few; the rest,
/// including 11-14, → Many.
pub fn plural_category(n: u64) -> Plural {
    if (11..=14).contains(&(n % 100)) {
        return Plural::Many;
    }
    match n % 10 {
        1 => Plural::One,
        2..=4 => Plural::Few,
        _ => Plural::Many,
    }
}

/// Remaining wait rounded up to whole minutes.
pub fn minutes_ceil(remaining: TimeDelta) -> u64 {
    let millis = remaining.num_milliseconds().max(0) as u64;
    millis.div_ceil(60_000)
}

pub fn minutes_noun(n: u64) -> &'static str {
    match plural_category(n) {
        Plural::One => "минуту",
        Plural::Few => "минуты",
        Plural::Many => "минут",
    }
}
