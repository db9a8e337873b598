//! Memory: repeat an ever-growing sequence of A and B cues.
//!
//! Each level replays the sequence from the start with one new element,
//! A as a blue light on the left with a low tone, B as a red light on the
//! right with a high tone. The score is the number of levels completed.

use rand::Rng;

use crate::config::Tuning;
use crate::input::InputEvent;
use crate::peripherals::{Color, Peripherals};
use crate::round::countdown;
use crate::stage::Stage;
use crate::tone;

const CUE_A: (u8, u8, Color, u32) = (1, 2, Color::BLUE, 330);
const CUE_B: (u8, u8, Color, u32) = (3, 2, Color::RED, 494);

pub struct MemoryStage {
    tuning: Tuning,
}

impl MemoryStage {
    pub fn new(tuning: &Tuning) -> Self {
        MemoryStage { tuning: tuning.clone() }
    }

    /// Play the whole game over a fixed cue sequence (`false` = A,
    /// `true` = B). Levels grow one cue at a time up to the sequence
    /// length.
    fn play_seq(&self, p: &mut Peripherals, seq: &[bool]) -> Option<u32> {
        for level in 1..=seq.len() {
            p.screen.show_lines(&[&format!("Level {level}")]);
            p.clock.sleep_ms(600);

            for &cue in &seq[..level] {
                self.show_cue(p, cue, 300);
                p.clock.sleep_ms(200);
            }

            for &cue in &seq[..level] {
                let answer = self.wait_answer(p);
                self.show_cue(p, answer, 150);
                if answer != cue {
                    tone::play_game_over(p.speaker.as_mut(), p.clock.as_ref());
                    let reached = level - 1;
                    p.screen.show_lines(&[
                        "Wrong!",
                        &format!("Reached level {reached}"),
                        "",
                        "Press any button",
                    ]);
                    p.wait_any_press();
                    return Some(reached as u32);
                }
            }
            tone::beep(p.speaker.as_mut());
            p.clock.sleep_ms(400);
        }

        p.screen.show_lines(&["Perfect memory!", "", "Press any button"]);
        tone::play_finish(p.speaker.as_mut(), p.clock.as_ref());
        p.wait_any_press();
        Some(seq.len() as u32)
    }

    /// Light and sound one cue, blocking for its duration.
    fn show_cue(&self, p: &mut Peripherals, cue: bool, ms: u64) {
        let (x, y, color, freq) = if cue { CUE_B } else { CUE_A };
        p.grid.set(x, y, color);
        p.speaker.play(freq, ms);
        p.grid.set(x, y, Color::OFF);
    }

    /// Block until A or B; `false` = A, `true` = B. Other input is
    /// ignored.
    fn wait_answer(&self, p: &mut Peripherals) -> bool {
        loop {
            match p.input.poll() {
                Some(InputEvent::ButtonA) => return false,
                Some(InputEvent::ButtonB) => return true,
                _ => {}
            }
            p.clock.sleep_ms(self.tuning.press_poll_ms);
        }
    }
}

impl Stage for MemoryStage {
    fn run(&mut self, p: &mut Peripherals) -> Option<u32> {
        p.screen.show_lines(&[
            "Memory",
            "",
            "Watch the cues,",
            "repeat with A/B",
            "",
            "Press any button",
        ]);
        p.wait_any_press();
        countdown(p.screen.as_mut(), p.speaker.as_mut(), p.clock.as_ref(), self.tuning.countdown_from);
        p.screen.clear();

        let mut rng = rand::rng();
        let seq: Vec<bool> = (0..self.tuning.memory_max_level)
            .map(|_| rng.random_bool(0.5))
            .collect();
        self.play_seq(p, &seq)
    }
}
