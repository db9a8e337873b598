//! Tilt Run: steer a dot across the matrix by tilting the board and
//! collect as many targets as possible before time runs out.

use rand::Rng;

use crate::config::Tuning;
use crate::peripherals::{AccelSample, Color, Peripherals};
use crate::round::{countdown, tilt_steps, Cadence, GridPos, RoundTimer};
use crate::stage::Stage;
use crate::{tone, GRID_SIZE};

pub struct TiltStage {
    tuning: Tuning,
}

impl TiltStage {
    pub fn new(tuning: &Tuning) -> Self {
        TiltStage { tuning: tuning.clone() }
    }

    fn play(&self, p: &mut Peripherals, rng: &mut impl Rng) -> Option<u32> {
        let zero = super::calibrate_zero(p, &self.tuning);
        countdown(p.screen.as_mut(), p.speaker.as_mut(), p.clock.as_ref(), self.tuning.countdown_from);
        p.screen.clear();

        let timer = RoundTimer::new(self.tuning.tilt_round_secs * 1000, p.clock.now_ms());
        let mut status = Cadence::new(self.tuning.display_refresh_ms, 0);
        let mut pos = GridPos::CENTER;
        let mut target = spawn_target(rng, pos);
        let mut score: u32 = 0;
        self.draw(p, pos, target);

        loop {
            let now = p.clock.now_ms();
            if timer.expired(now) {
                break;
            }

            if let Some(s) = sample_or_skip(p) {
                let rel = AccelSample {
                    x: s.x - zero.x,
                    y: s.y - zero.y,
                    z: s.z - zero.z,
                };
                let (dx, dy) = tilt_steps(rel, self.tuning.tilt_sensitivity);
                let next = pos.step_clamped(dx, dy);
                if next != pos {
                    pos = next;
                    if pos == target {
                        score += 1;
                        tone::beep(p.speaker.as_mut());
                        target = spawn_target(rng, pos);
                    }
                    self.draw(p, pos, target);
                }
            }

            if status.ready(now) {
                p.screen.show_lines(&[
                    "Tilt Run",
                    &format!("Time: {}s", timer.remaining_secs(now)),
                    &format!("Score: {score}"),
                ]);
            }
            p.clock.sleep_ms(self.tuning.sensor_poll_ms);
        }

        p.screen.show_lines(&[
            "Time's up!",
            &format!("Targets: {score}"),
            "",
            "Press any button",
        ]);
        tone::play_finish(p.speaker.as_mut(), p.clock.as_ref());
        p.wait_any_press();
        Some(score)
    }

    fn draw(&self, p: &mut Peripherals, pos: GridPos, target: GridPos) {
        p.grid.clear();
        p.grid.set(target.x, target.y, Color::GREEN);
        p.grid.set(pos.x, pos.y, Color::BLUE);
    }
}

/// One accelerometer reading; a failed read logs and yields nothing, so
/// the caller just keeps its previous state for this beat.
pub(super) fn sample_or_skip(p: &mut Peripherals) -> Option<AccelSample> {
    let accel = p.accel.as_mut()?;
    match accel.sample() {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::debug!("sample skipped: {e}");
            None
        }
    }
}

fn spawn_target(rng: &mut impl Rng, avoid: GridPos) -> GridPos {
    loop {
        let t = GridPos::new(rng.random_range(0..GRID_SIZE), rng.random_range(0..GRID_SIZE));
        if t != avoid {
            return t;
        }
    }
}

impl Stage for TiltStage {
    fn run(&mut self, p: &mut Peripherals) -> Option<u32> {
        if !super::require_accel(p) {
            return None;
        }
        p.screen.show_lines(&[
            "Tilt Run",
            "",
            "Tilt the board to",
            "catch the green",
            "",
            "Press any button",
        ]);
        p.wait_any_press();
        let mut rng = rand::rng();
        self.play(p, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockPad, Rig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_missing_sensor_refuses_to_start() {
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(MockPad::tapping_a(), false, false, &tuning);
        let mut stage = TiltStage::new(&tuning);

        assert_eq!(stage.run(&mut p), None);
        assert!(rig.screen.saw("Sensor not found"));
    }

    #[test]
    fn test_flat_board_never_moves() {
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(MockPad::tapping_a(), false, true, &tuning);
        let stage = TiltStage::new(&tuning);
        let mut rng = StdRng::seed_from_u64(11);

        // steady level reading the whole round
        let score = stage.play(&mut p, &mut rng);
        assert_eq!(score, Some(0));
        assert!(rig.screen.saw("Time's up!"));
        assert_eq!(rig.grid.lit(), 2, "player and target stay on until the manager resets");
    }

    #[test]
    fn test_spawn_target_avoids_player() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert_ne!(spawn_target(&mut rng, GridPos::CENTER), GridPos::CENTER);
        }
    }

    #[test]
    fn test_transient_read_failures_are_skipped() {
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(MockPad::tapping_a(), false, true, &tuning);
        let stage = TiltStage::new(&tuning);
        let mut rng = StdRng::seed_from_u64(11);

        // a burst of failures early in the round must not end it
        let accel = rig.accel.as_ref().unwrap();
        for _ in 0..20 {
            accel.push_failure();
        }
        assert_eq!(stage.play(&mut p, &mut rng), Some(0));
    }
}
