//! Reaction: press as fast as possible when a green light appears.
//!
//! Each round has a quiet gap, then a light. Green wants a press inside
//! the reaction window; red is a decoy that punishes pressing. Pressing
//! during the quiet gap is a false start and ends the game. The score is
//! the number of green lights hit, and the hit times are shown as a
//! ranking at the end.

use rand::Rng;

use crate::clock::elapsed;
use crate::config::Tuning;
use crate::peripherals::{Color, Peripherals};
use crate::round::countdown;
use crate::stage::Stage;
use crate::{tone, GRID_SIZE};

pub struct ReactionStage {
    tuning: Tuning,
}

impl ReactionStage {
    pub fn new(tuning: &Tuning) -> Self {
        ReactionStage { tuning: tuning.clone() }
    }

    /// All rounds, no framing screens. `Err` carries the losing reason.
    fn play_rounds(&self, p: &mut Peripherals, rng: &mut impl Rng) -> Result<Vec<u32>, &'static str> {
        let mut times = Vec::new();
        for round in 0..self.tuning.reaction_rounds {
            let gap = rng.random_range(1000..3000);
            if self.press_within(p, gap).is_some() {
                return Err("Too soon!");
            }

            let x = rng.random_range(0..GRID_SIZE);
            let y = rng.random_range(0..GRID_SIZE);
            if rng.random_bool(1.0 / 3.0) {
                p.grid.set(x, y, Color::RED);
                let pressed = self.press_within(p, self.tuning.reaction_window_ms);
                p.grid.set(x, y, Color::OFF);
                if pressed.is_some() {
                    return Err("Red means wait!");
                }
            }

            p.grid.set(x, y, Color::GREEN);
            let hit = self.press_within(p, self.tuning.reaction_window_ms);
            p.grid.set(x, y, Color::OFF);
            match hit {
                Some(ms) => {
                    times.push(ms as u32);
                    tone::beep(p.speaker.as_mut());
                }
                None => tracing::debug!(round, "target timed out"),
            }
        }
        Ok(times)
    }

    /// Poll for a press edge until the window closes; reports the reaction
    /// time on a hit.
    fn press_within(&self, p: &mut Peripherals, window_ms: u64) -> Option<u64> {
        let start = p.clock.now_ms();
        loop {
            if p.input.poll().is_some_and(|e| !e.is_directional()) {
                return Some(elapsed(p.clock.now_ms(), start));
            }
            if elapsed(p.clock.now_ms(), start) >= window_ms {
                return None;
            }
            p.clock.sleep_ms(self.tuning.press_poll_ms);
        }
    }
}

impl Stage for ReactionStage {
    fn run(&mut self, p: &mut Peripherals) -> Option<u32> {
        p.screen.show_lines(&[
            "Reaction",
            "",
            "Press on green",
            "Red is a trap",
            "",
            "Press any button",
        ]);
        p.wait_any_press();
        countdown(p.screen.as_mut(), p.speaker.as_mut(), p.clock.as_ref(), self.tuning.countdown_from);
        p.screen.clear();

        let mut rng = rand::rng();
        match self.play_rounds(p, &mut rng) {
            Err(reason) => {
                tone::play_game_over(p.speaker.as_mut(), p.clock.as_ref());
                p.screen.show_lines(&["Game over", reason, "", "Press any button"]);
                p.wait_any_press();
                None
            }
            Ok(times) if times.is_empty() => {
                p.screen.show_lines(&["No hits", "", "Press any button"]);
                p.wait_any_press();
                None
            }
            Ok(times) => {
                p.screen.show_ranking(&times);
                tone::play_finish(p.speaker.as_mut(), p.clock.as_ref());
                p.wait_any_press();
                Some(times.len() as u32)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::mocks::{MockPad, Rig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_idle_player_hits_nothing() {
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(MockPad::idle(), false, false, &tuning);
        let stage = ReactionStage::new(&tuning);
        let mut rng = StdRng::seed_from_u64(7);

        let times = stage.play_rounds(&mut p, &mut rng).unwrap();
        assert!(times.is_empty());
        assert_eq!(rig.grid.lit(), 0, "every light goes out again");
        // every round burns at least its quiet gap plus one window
        assert!(rig.clock.now_ms() >= 3 * (1000 + 1000));
    }

    #[test]
    fn test_press_in_quiet_gap_is_false_start() {
        let tuning = Tuning::default();
        let (mut p, _rig) = Rig::build(MockPad::script(vec![(true, false)]), false, false, &tuning);
        let stage = ReactionStage::new(&tuning);
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(stage.play_rounds(&mut p, &mut rng), Err("Too soon!"));
    }

    #[test]
    fn test_press_within_measures_elapsed() {
        let tuning = Tuning::default();
        // press edge on the third poll, 20ms in
        let pad = MockPad::script(vec![(false, false), (false, false), (true, false)]);
        let (mut p, _rig) = Rig::build(pad, false, false, &tuning);
        let stage = ReactionStage::new(&tuning);

        assert_eq!(stage.press_within(&mut p, 1000), Some(20));
    }

    #[test]
    fn test_press_within_times_out() {
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(MockPad::idle(), false, false, &tuning);
        let stage = ReactionStage::new(&tuning);

        assert_eq!(stage.press_within(&mut p, 500), None);
        assert_eq!(rig.clock.now_ms(), 500);
    }
}
