//! Balance: hold the board level for the whole round.
//!
//! After calibration every sample is graded 1 (steady) to 5 (way off) by
//! how far the strongest axis has drifted from the zero reference, and
//! the matrix shows the grade as a growing cross. The score is the
//! percentage of samples that stayed steady.

use crate::config::Tuning;
use crate::peripherals::{Color, Peripherals};
use crate::round::{countdown, Cadence, RoundTimer};
use crate::stage::Stage;
use crate::tone;

pub struct BalanceStage {
    tuning: Tuning,
}

impl BalanceStage {
    pub fn new(tuning: &Tuning) -> Self {
        BalanceStage { tuning: tuning.clone() }
    }

    fn play(&self, p: &mut Peripherals) -> Option<u32> {
        let zero = super::calibrate_zero(p, &self.tuning);
        countdown(p.screen.as_mut(), p.speaker.as_mut(), p.clock.as_ref(), self.tuning.countdown_from);
        p.screen.clear();

        let timer = RoundTimer::new(self.tuning.balance_round_secs * 1000, p.clock.now_ms());
        let mut status = Cadence::new(self.tuning.display_refresh_ms, 0);
        let mut steady: u32 = 0;
        let mut total: u32 = 0;

        loop {
            let now = p.clock.now_ms();
            if timer.expired(now) {
                break;
            }

            if let Some(s) = super::tilt::sample_or_skip(p) {
                let drift = (s.x - zero.x).abs().max((s.y - zero.y).abs());
                let grade = drift_grade(drift, self.tuning.tilt_sensitivity);
                total += 1;
                if grade == 1 {
                    steady += 1;
                }
                draw_grade(p, grade);
            }

            if status.ready(now) {
                p.screen.show_lines(&[
                    "Balance",
                    &format!("Time: {}s", timer.remaining_secs(now)),
                ]);
            }
            p.clock.sleep_ms(self.tuning.sensor_poll_ms);
        }

        if total == 0 {
            tracing::warn!("balance round saw no usable samples");
            p.screen.show_lines(&["Sensor trouble,", "no result", "", "Press any button"]);
            p.wait_any_press();
            return None;
        }

        let score = steady * 100 / total;
        p.screen.show_lines(&[
            "Time's up!",
            &format!("Steady: {score}%"),
            "",
            "Press any button",
        ]);
        tone::play_finish(p.speaker.as_mut(), p.clock.as_ref());
        p.wait_any_press();
        Some(score)
    }
}

/// Grade a drift magnitude into 1..=5, one band per multiple of the tilt
/// sensitivity. Band edges are inclusive, matching the movement dead
/// band.
fn drift_grade(drift: f32, band: f32) -> u8 {
    for grade in 1..5u8 {
        if drift <= band * grade as f32 {
            return grade;
        }
    }
    5
}

/// Growing cross centered on the matrix: green when steady, yellow when
/// drifting, red arms at the outer grades.
fn draw_grade(p: &mut Peripherals, grade: u8) {
    p.grid.clear();
    let color = match grade {
        1 => Color::GREEN,
        2 => Color::YELLOW,
        _ => Color::RED,
    };
    p.grid.set(2, 2, color);
    for arm in 1..grade {
        let arm = arm.min(2);
        p.grid.set(2 + arm, 2, color);
        p.grid.set(2 - arm, 2, color);
        p.grid.set(2, 2 + arm, color);
        p.grid.set(2, 2 - arm, color);
    }
}

impl Stage for BalanceStage {
    fn run(&mut self, p: &mut Peripherals) -> Option<u32> {
        if !super::require_accel(p) {
            return None;
        }
        p.screen.show_lines(&[
            "Balance",
            "",
            "Keep the board",
            "perfectly level",
            "",
            "Press any button",
        ]);
        p.wait_any_press();
        self.play(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockPad, Rig};

    #[test]
    fn test_drift_grade_bands_are_inclusive() {
        assert_eq!(drift_grade(0.0, 0.3), 1);
        assert_eq!(drift_grade(0.3, 0.3), 1, "band edge stays in the lower grade");
        assert_eq!(drift_grade(0.31, 0.3), 2);
        assert_eq!(drift_grade(0.9, 0.3), 3);
        assert_eq!(drift_grade(5.0, 0.3), 5);
    }

    #[test]
    fn test_flat_board_scores_full_marks() {
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(MockPad::tapping_a(), false, true, &tuning);
        let stage = BalanceStage::new(&tuning);

        assert_eq!(stage.play(&mut p), Some(100));
        assert!(rig.screen.saw("Steady: 100%"));
        assert_eq!(rig.grid.get(2, 2), Some(Color::GREEN));
    }

    #[test]
    fn test_steady_grade_lights_only_center() {
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(MockPad::idle(), false, false, &tuning);

        draw_grade(&mut p, 1);
        assert_eq!(rig.grid.lit(), 1);

        draw_grade(&mut p, 3);
        assert!(rig.grid.lit() > 1);
        assert_eq!(rig.grid.get(2, 2), Some(Color::RED));
    }

    #[test]
    fn test_top_grade_cross_stays_on_grid() {
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(MockPad::idle(), false, false, &tuning);

        draw_grade(&mut p, 5);
        assert_eq!(rig.grid.lit(), 9, "center plus four two-cell arms");
        for (x, y) in [(0, 2), (4, 2), (2, 0), (2, 4)] {
            assert_eq!(rig.grid.get(x, y), Some(Color::RED));
        }
    }

    #[test]
    fn test_all_failed_reads_give_no_result() {
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(MockPad::tapping_a(), false, true, &tuning);
        let stage = BalanceStage::new(&tuning);

        // round length in samples, plus calibration, all failing
        let accel = rig.accel.as_ref().unwrap();
        for _ in 0..200 {
            accel.push_failure();
        }
        assert_eq!(stage.play(&mut p), None);
        assert!(rig.screen.saw("no result"));
    }
}
