//! Monotonic Timing
//!
//! A [`Clock`] reads nanoseconds from a [`TimeSource`] and guarantees that
//! successive readings never decrease. When the source jumps backwards the
//! regression is accumulated as skew and added to every later reading.
//!
//! Two sources ship with the crate: [`HighResolution`] (`std::time::Instant`)
//! and [`Coarse`] (wall clock at millisecond granularity). Whether the clock is
//! high resolution drives the scaler's growth policy.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A raw time source. Readings may regress; [`Clock`] compensates.
pub trait TimeSource {
    /// Current reading in nanoseconds since an arbitrary epoch.
    fn read(&mut self) -> u64;

    /// Whether readings have sub-millisecond granularity.
    fn is_high_resolution(&self) -> bool;
}

// ─── Sources ─────────────────────────────────────────────────────────────────

/// `Instant` based source, nanoseconds since the source was created.
#[derive(Debug, Clone, Copy)]
pub struct HighResolution {
    epoch: Instant,
}

impl HighResolution {
    /// Create a source whose epoch is now
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for HighResolution {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for HighResolution {
    #[inline(always)]
    fn read(&mut self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn is_high_resolution(&self) -> bool {
        true
    }
}

/// Wall clock source truncated to whole milliseconds.
///
/// Wall time can be adjusted backwards by the OS, which is exactly the case
/// the skew compensation in [`Clock`] exists for.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coarse;

impl TimeSource for Coarse {
    fn read(&mut self) -> u64 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        millis.saturating_mul(1_000_000)
    }

    fn is_high_resolution(&self) -> bool {
        false
    }
}

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Monotonic nanosecond clock with skew compensation
pub struct Clock {
    source: Box<dyn TimeSource>,
    latest: u64,
    skew: u64,
}

impl Clock {
    /// Clock over the high-resolution source
    pub fn new() -> Self {
        Self::with_source(HighResolution::new())
    }

    /// Clock over the millisecond wall-clock source
    pub fn coarse() -> Self {
        Self::with_source(Coarse)
    }

    /// Clock over an arbitrary source
    pub fn with_source(source: impl TimeSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            latest: 0,
            skew: 0,
        }
    }

    /// Read the clock. Never returns less than a previous reading.
    pub fn now(&mut self) -> u64 {
        let raw = self.source.read();
        if raw < self.latest {
            self.skew += self.latest - raw;
        }
        self.latest = raw;
        raw + self.skew
    }

    /// Whether the underlying source is high resolution
    pub fn is_high_resolution(&self) -> bool {
        self.source.is_high_resolution()
    }

    /// Total backwards movement absorbed so far
    pub fn skew(&self) -> u64 {
        self.skew
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("high_resolution", &self.is_high_resolution())
            .field("latest", &self.latest)
            .field("skew", &self.skew)
            .finish()
    }
}

// ─── Timer ───────────────────────────────────────────────────────────────────

/// Start/stop timer accumulating elapsed nanoseconds for one trial.
///
/// `start` while running and `stop` while stopped are no-ops.
#[derive(Debug)]
pub struct Timer {
    clock: Clock,
    running: bool,
    start: u64,
    elapsed: u64,
}

impl Timer {
    /// Create a stopped timer reading from `clock`
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            running: false,
            start: 0,
            elapsed: 0,
        }
    }

    /// Begin counting toward `elapsed`
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.start = self.clock.now();
        }
    }

    /// Stop counting and fold the running span into `elapsed`
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.elapsed += self.clock.now() - self.start;
        }
    }

    /// Zero `elapsed`; a running timer keeps running from now
    pub fn reset(&mut self) {
        if self.running {
            self.start = self.clock.now();
        }
        self.elapsed = 0;
    }

    /// Accumulated nanoseconds, excluding any span still running
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Whether the timer is counting
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the clock behind this timer is high resolution
    pub fn is_high_resolution(&self) -> bool {
        self.clock.is_high_resolution()
    }

    /// Read the underlying clock
    pub fn now(&mut self) -> u64 {
        self.clock.now()
    }
}
