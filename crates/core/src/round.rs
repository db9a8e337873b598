//! Building blocks shared by every timed round: the pre-round countdown,
//! periodic cadence gates, the round budget timer, sensor calibration, and
//! tilt/grid movement math.
//!
//! All of it is pure over `now` ticks from a [`Clock`], so stages stay
//! deterministic under a scripted clock.

use crate::clock::{elapsed, Clock};
use crate::peripherals::{AccelSample, Accelerometer, Speaker, TextScreen};
use crate::GRID_SIZE;

/// Big-digit countdown from `from` down to 1, one second per step, with a
/// rising beep per digit.
pub fn countdown(screen: &mut dyn TextScreen, speaker: &mut dyn Speaker, clock: &dyn Clock, from: u8) {
    for digit in (1..=from).rev() {
        screen.show_big_digit(digit);
        speaker.play(440 + digit as u32 * 100, 200);
        clock.sleep_ms(800);
    }
}

/// Periodic gate: `ready` reports true at most once per period and re-arms
/// itself on acceptance. A wrapped tick counter reads as zero elapsed and
/// the gate simply re-arms on the next period.
pub struct Cadence {
    period_ms: u64,
    last: u64,
}

impl Cadence {
    pub fn new(period_ms: u64, now: u64) -> Self {
        Cadence { period_ms, last: now }
    }

    pub fn ready(&mut self, now: u64) -> bool {
        if elapsed(now, self.last) >= self.period_ms {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Wall-clock budget for one round.
pub struct RoundTimer {
    budget_ms: u64,
    start: u64,
}

impl RoundTimer {
    pub fn new(budget_ms: u64, now: u64) -> Self {
        RoundTimer { budget_ms, start: now }
    }

    pub fn elapsed_ms(&self, now: u64) -> u64 {
        elapsed(now, self.start)
    }

    /// Whole seconds left, rounded up so the display never shows 0 while
    /// time remains.
    pub fn remaining_secs(&self, now: u64) -> u64 {
        let left = self.budget_ms.saturating_sub(self.elapsed_ms(now));
        (left + 999) / 1000
    }

    pub fn expired(&self, now: u64) -> bool {
        self.elapsed_ms(now) >= self.budget_ms
    }
}

/// Average `samples` readings into a zero reference for relative tilt.
///
/// Failed reads are skipped, not retried; if every read fails the
/// reference is all zeroes and raw readings pass through unshifted.
pub fn calibrate(
    accel: &mut dyn Accelerometer,
    clock: &dyn Clock,
    samples: u32,
    interval_ms: u64,
) -> AccelSample {
    let mut sum = AccelSample::default();
    let mut good = 0u32;
    for _ in 0..samples {
        match accel.sample() {
            Ok(s) => {
                sum.x += s.x;
                sum.y += s.y;
                sum.z += s.z;
                good += 1;
            }
            Err(e) => tracing::debug!("calibration sample skipped: {e}"),
        }
        clock.sleep_ms(interval_ms);
    }
    if good == 0 {
        tracing::warn!("calibration got no samples, zero reference stays at origin");
        return AccelSample::default();
    }
    AccelSample {
        x: sum.x / good as f32,
        y: sum.y / good as f32,
        z: sum.z / good as f32,
    }
}

/// One axis reading to a movement step. Readings inside `±sensitivity`
/// (boundary included) hold still.
pub fn tilt_step(value: f32, sensitivity: f32) -> i8 {
    if value > sensitivity {
        1
    } else if value < -sensitivity {
        -1
    } else {
        0
    }
}

/// Both axes at once. Tilting away from the player moves up (+y),
/// tilting right moves right (+x); every stage uses this same mapping.
pub fn tilt_steps(sample: AccelSample, sensitivity: f32) -> (i8, i8) {
    (tilt_step(sample.x, sensitivity), tilt_step(sample.y, sensitivity))
}

/// Position on the LED matrix. Origin bottom-left, y growing away from
/// the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPos {
    pub x: u8,
    pub y: u8,
}

impl GridPos {
    pub const CENTER: GridPos = GridPos { x: 2, y: 2 };

    pub const fn new(x: u8, y: u8) -> Self {
        GridPos { x, y }
    }

    /// Move by one step per axis, clamped to the matrix edges.
    pub fn step_clamped(self, dx: i8, dy: i8) -> GridPos {
        GridPos {
            x: add_clamped(self.x, dx),
            y: add_clamped(self.y, dy),
        }
    }

    /// Move with per-axis wall rejection: the X step is tried against the
    /// current row first, then the Y step against the resulting column.
    /// Each axis succeeds or fails on its own, so sliding along a wall
    /// works.
    pub fn step_blocked(self, dx: i8, dy: i8, blocked: impl Fn(u8, u8) -> bool) -> GridPos {
        let mut pos = self;
        let nx = add_clamped(pos.x, dx);
        if nx != pos.x && !blocked(nx, pos.y) {
            pos.x = nx;
        }
        let ny = add_clamped(pos.y, dy);
        if ny != pos.y && !blocked(pos.x, ny) {
            pos.y = ny;
        }
        pos
    }
}

fn add_clamped(v: u8, d: i8) -> u8 {
    (v as i16 + d as i16).clamp(0, (GRID_SIZE - 1) as i16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockAccel, MockClock, MockScreen, MockSpeaker};

    #[test]
    fn test_countdown_shows_each_digit() {
        let clock = MockClock::new();
        let mut screen = MockScreen::default();
        let mut speaker = MockSpeaker::default();
        countdown(&mut screen, &mut speaker, &clock, 3);
        assert_eq!(screen.screens().len(), 3);
        assert_eq!(speaker.tones(), vec![(740, 200), (640, 200), (540, 200)]);
        assert_eq!(clock.now_ms(), 3 * 800);
    }

    #[test]
    fn test_cadence_rearms_on_acceptance() {
        let mut gate = Cadence::new(500, 0);
        assert!(!gate.ready(100));
        assert!(!gate.ready(499));
        assert!(gate.ready(500));
        assert!(!gate.ready(900), "accepted at 500, next slot is 1000");
        assert!(gate.ready(1000));
    }

    #[test]
    fn test_cadence_survives_tick_wrap() {
        let mut gate = Cadence::new(500, u64::MAX - 10);
        // now < last reads as zero elapsed, never a giant interval
        assert!(!gate.ready(100));
    }

    #[test]
    fn test_round_timer_expiry_and_remaining() {
        let timer = RoundTimer::new(30_000, 1_000);
        assert!(!timer.expired(1_000));
        assert_eq!(timer.remaining_secs(1_000), 30);
        assert_eq!(timer.remaining_secs(29_500), 2, "partial second rounds up");
        assert!(timer.expired(31_000));
        assert_eq!(timer.remaining_secs(31_000), 0);
    }

    #[test]
    fn test_calibrate_averages_and_skips_failures() {
        let clock = MockClock::new();
        let mut accel = MockAccel::default();
        accel.push_level(1.0, 0.0, 0.0);
        accel.push_failure();
        accel.push_level(3.0, 2.0, 0.0);
        let zero = calibrate(&mut accel, &clock, 3, 100);
        assert_eq!(zero.x, 2.0);
        assert_eq!(zero.y, 1.0);
        assert_eq!(clock.now_ms(), 300, "failed reads still pace the loop");
    }

    #[test]
    fn test_calibrate_all_failures_yields_origin() {
        let clock = MockClock::new();
        let mut accel = MockAccel::default();
        for _ in 0..3 {
            accel.push_failure();
        }
        let zero = calibrate(&mut accel, &clock, 3, 10);
        assert_eq!(zero, AccelSample::default());
    }

    #[test]
    fn test_tilt_step_band_is_inclusive() {
        assert_eq!(tilt_step(0.3, 0.3), 0, "boundary reading holds still");
        assert_eq!(tilt_step(-0.3, 0.3), 0);
        assert_eq!(tilt_step(0.31, 0.3), 1);
        assert_eq!(tilt_step(-0.31, 0.3), -1);
    }

    #[test]
    fn test_step_clamped_at_edges() {
        assert_eq!(GridPos::new(0, 0).step_clamped(-1, -1), GridPos::new(0, 0));
        assert_eq!(GridPos::new(4, 4).step_clamped(1, 1), GridPos::new(4, 4));
        assert_eq!(GridPos::CENTER.step_clamped(1, -1), GridPos::new(3, 1));
    }

    #[test]
    fn test_step_blocked_axes_are_independent() {
        // wall directly right of center; diagonal move keeps its y step
        let wall = |x: u8, y: u8| x == 3 && y == 2;
        assert_eq!(
            GridPos::CENTER.step_blocked(1, 1, wall),
            GridPos::new(2, 3),
            "x rejected, y still applied"
        );
        // no wall anywhere, both apply
        assert_eq!(
            GridPos::CENTER.step_blocked(1, 1, |_, _| false),
            GridPos::new(3, 3)
        );
    }

    #[test]
    fn test_step_blocked_slides_along_wall() {
        // full wall at row y=3; moving up-right slides right
        let wall = |_x: u8, y: u8| y == 3;
        assert_eq!(GridPos::CENTER.step_blocked(1, 1, wall), GridPos::new(3, 2));
    }
}
