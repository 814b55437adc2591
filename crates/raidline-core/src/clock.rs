//! Match, raid, and timeout clocks.
//!
//! The three countdowns share one `paused` flag and are driven by a single
//! per-second tick from the runner. [`ClockSet::tick`] reads the flag once
//! at the start of the tick and fans out to each countdown:
//!
//! - The timeout clock runs while paused (it is the reason for the pause)
//!   and clears the pause when it reaches zero.
//! - The match clock and raid clock only run while not paused.
//! - Reaching zero stops a countdown. Nothing is resolved automatically;
//!   the engine decides what an expiry means for the current phase.
//!
//! All arithmetic saturates; a countdown never wraps below zero.

use raidline_types::ClockPositions;

/// A single countdown in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    /// Seconds left.
    remaining: u32,
    /// Whether the countdown is ticking.
    running: bool,
}

impl Countdown {
    /// A running countdown from `seconds`.
    pub const fn started(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            running: seconds > 0,
        }
    }

    /// A stopped countdown showing `seconds`.
    pub const fn stopped(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            running: false,
        }
    }

    /// Seconds left.
    pub const fn remaining(self) -> u32 {
        self.remaining
    }

    /// Whether the countdown is ticking.
    pub const fn is_running(self) -> bool {
        self.running
    }

    /// Stop the countdown without changing the display.
    pub const fn stop(&mut self) {
        self.running = false;
    }

    /// Advance one second. Returns `true` if this step reached zero.
    const fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return true;
        }
        false
    }
}

/// What happened during one clock tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockTick {
    /// Raid clock reading after the tick, if the raid clock ticked.
    pub raid_remaining: Option<u32>,
    /// The raid clock reached zero.
    pub raid_expired: bool,
    /// The match (or interval) clock reached zero.
    pub match_expired: bool,
    /// The timeout clock reached zero and the pause was cleared.
    pub timeout_expired: bool,
    /// A periodic clock sync is due.
    pub sync_due: bool,
}

/// The three countdowns and the shared pause flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSet {
    /// The half clock, or the interval clock during half-time.
    match_clock: Countdown,
    /// The per-raid countdown, present while a raid is in flight.
    raid_clock: Option<Countdown>,
    /// The timeout countdown, present while a timeout is running.
    timeout_clock: Option<Countdown>,
    /// Shared pause flag gating the match and raid clocks.
    paused: bool,
    /// Running seconds since the last periodic sync.
    since_sync: u32,
}

impl ClockSet {
    /// A clock set with a stopped match clock showing `seconds`.
    pub const fn new(seconds: u32) -> Self {
        Self {
            match_clock: Countdown::stopped(seconds),
            raid_clock: None,
            timeout_clock: None,
            paused: false,
            since_sync: 0,
        }
    }

    /// The match (or interval) countdown.
    pub const fn match_clock(&self) -> Countdown {
        self.match_clock
    }

    /// The raid countdown, if a raid is timed.
    pub const fn raid_clock(&self) -> Option<Countdown> {
        self.raid_clock
    }

    /// The timeout countdown, if a timeout is running.
    pub const fn timeout_clock(&self) -> Option<Countdown> {
        self.timeout_clock
    }

    /// Whether the shared pause flag is set.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether a timeout is running.
    pub const fn timeout_active(&self) -> bool {
        self.timeout_clock.is_some()
    }

    /// Restart the match clock from `seconds` and reset the sync counter.
    pub const fn start_match_clock(&mut self, seconds: u32) {
        self.match_clock = Countdown::started(seconds);
        self.since_sync = 0;
    }

    /// Freeze the match clock display.
    pub const fn stop_match_clock(&mut self) {
        self.match_clock.stop();
    }

    /// Start the raid clock from `seconds`.
    pub const fn start_raid_clock(&mut self, seconds: u32) {
        self.raid_clock = Some(Countdown::started(seconds));
    }

    /// Remove the raid clock.
    pub const fn clear_raid_clock(&mut self) {
        self.raid_clock = None;
    }

    /// Start a timeout of `seconds` and set the pause flag.
    pub const fn start_timeout(&mut self, seconds: u32) {
        self.timeout_clock = Some(Countdown::started(seconds));
        self.paused = true;
    }

    /// End the running timeout and clear the pause flag.
    pub const fn end_timeout(&mut self) {
        self.timeout_clock = None;
        self.paused = false;
    }

    /// Set or clear the pause flag directly.
    pub const fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Advance every countdown by one second.
    ///
    /// `sync_interval` is the number of running match-clock seconds
    /// between periodic syncs.
    pub fn tick(&mut self, sync_interval: u32) -> ClockTick {
        let paused = self.paused;
        let mut report = ClockTick::default();

        if let Some(timeout) = self.timeout_clock.as_mut() {
            if timeout.step() {
                report.timeout_expired = true;
                self.end_timeout();
            }
        }

        if paused {
            return report;
        }

        if self.match_clock.is_running() {
            report.match_expired = self.match_clock.step();
            self.since_sync = self.since_sync.saturating_add(1);
            if self.since_sync >= sync_interval {
                self.since_sync = 0;
                report.sync_due = true;
            }
        }

        if let Some(raid) = self.raid_clock.as_mut() {
            if raid.is_running() {
                report.raid_expired = raid.step();
                report.raid_remaining = Some(raid.remaining());
            }
        }

        report
    }

    /// Current clock positions for a periodic sync.
    pub fn positions(&self) -> ClockPositions {
        ClockPositions {
            match_remaining: self.match_clock.remaining(),
            raid_remaining: self.raid_clock.map(Countdown::remaining),
            timeout_remaining: self.timeout_clock.map(Countdown::remaining),
            paused: self.paused,
        }
    }
}
