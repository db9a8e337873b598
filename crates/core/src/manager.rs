//! Top-level session loop: opener, main menu, stage dispatch, challenge
//! mode.
//!
//! The manager owns the peripherals for the whole session and lends them
//! to one stage at a time. Peripherals are reset before and after every
//! stage invocation, so no stage ever sees leftover light or sound from
//! the previous one, and every invocation gets a fresh stage instance
//! from its factory.

use crate::config::Tuning;
use crate::menu;
use crate::peripherals::Peripherals;
use crate::stage::{ScoreBoard, Stage, StageDescriptor};
use crate::tone;

pub struct StageManager {
    peripherals: Peripherals,
    tuning: Tuning,
    stages: Vec<StageDescriptor>,
    scores: ScoreBoard,
}

impl StageManager {
    pub fn new(peripherals: Peripherals, tuning: Tuning) -> Self {
        StageManager {
            peripherals,
            tuning,
            stages: Vec::new(),
            scores: ScoreBoard::default(),
        }
    }

    /// Add a stage to the menu, in registration order.
    pub fn register(
        &mut self,
        name: &str,
        factory: impl Fn(&Tuning) -> Box<dyn Stage> + 'static,
    ) {
        self.stages.push(StageDescriptor {
            name: name.to_string(),
            factory: Box::new(factory),
        });
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    /// Run the whole session: the menu until Exit is picked.
    ///
    /// Every pass re-enters through an instructions gate, so a stray
    /// press left over from a stage cannot launch the next game by
    /// itself.
    pub fn run_menu(&mut self) {
        loop {
            self.peripherals.reset();
            self.peripherals.screen.show_lines(&[
                "Matrix Arcade",
                "",
                "A: move  B: pick",
                "",
                "Press any button",
            ]);
            tone::play_start(self.peripherals.speaker.as_mut());
            self.peripherals.wait_any_press();

            let mut options: Vec<String> =
                self.stages.iter().map(|s| s.name.clone()).collect();
            options.push("Challenge".to_string());
            options.push("Exit".to_string());
            let refs: Vec<&str> = options.iter().map(String::as_str).collect();

            let choice = menu::navigate("Matrix Arcade", &refs, &mut self.peripherals, &self.tuning);
            if choice < self.stages.len() {
                self.run_one(choice);
            } else if choice == self.stages.len() {
                self.run_challenge();
            } else {
                self.peripherals.reset();
                self.peripherals.screen.show_lines(&["Thanks for playing!"]);
                tone::play_finish(self.peripherals.speaker.as_mut(), self.peripherals.clock.as_ref());
                return;
            }
        }
    }

    /// Run one registered stage and show its outcome.
    pub fn run_one(&mut self, idx: usize) {
        let name = self.stages[idx].name.clone();
        tracing::info!(stage = %name, "starting");

        self.peripherals.reset();
        let mut stage = (self.stages[idx].factory)(&self.tuning);
        let score = stage.run(&mut self.peripherals);
        self.peripherals.reset();
        self.scores.record(&name, score);
        tracing::info!(stage = %name, ?score, "finished");

        let score_line = score_line(score);
        self.peripherals.screen.show_lines(&[
            &format!("Stage: {name}"),
            &score_line,
            "",
            "Press any button",
        ]);
        self.peripherals.wait_any_press();
    }

    /// Every registered stage in order, accumulating one total. Scoreless
    /// runs count as zero; losing a stage never aborts the sequence.
    pub fn run_challenge(&mut self) {
        self.peripherals.reset();
        self.peripherals.screen.show_lines(&[
            "Challenge mode!",
            "All stages",
            "in sequence",
            "",
            "Press any button",
        ]);
        self.peripherals.wait_any_press();

        let count = self.stages.len();
        let mut total: u32 = 0;
        for idx in 0..count {
            let name = self.stages[idx].name.clone();
            self.peripherals.reset();
            self.peripherals.screen.show_lines(&[
                &format!("Stage {}/{}", idx + 1, count),
                &name,
                "",
                "Press any button",
            ]);
            self.peripherals.wait_any_press();

            let mut stage = (self.stages[idx].factory)(&self.tuning);
            let score = stage.run(&mut self.peripherals);
            self.peripherals.reset();
            self.scores.record(&name, score);
            total += score.unwrap_or(0);
            tracing::info!(stage = %name, ?score, total, "challenge step done");

            let score_line = score_line(score);
            self.peripherals.screen.show_lines(&[
                &format!("Stage {} done", idx + 1),
                &score_line,
                &format!("Total: {total}"),
                "",
                "Press any button",
                "to continue",
            ]);
            self.peripherals.wait_any_press();
        }

        self.peripherals.reset();
        self.peripherals.screen.show_lines(&[
            "Challenge complete!",
            &format!("Total: {total}"),
            "",
            "Press any button",
        ]);
        tone::play_finish(self.peripherals.speaker.as_mut(), self.peripherals.clock.as_ref());
        self.peripherals.wait_any_press();
    }
}

fn score_line(score: Option<u32>) -> String {
    match score {
        Some(s) => format!("Score: {s}"),
        None => "No score".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockPad, Rig};

    struct Fixed(Option<u32>);

    impl Stage for Fixed {
        fn run(&mut self, _p: &mut Peripherals) -> Option<u32> {
            self.0
        }
    }

    fn manager_with(
        pad: MockPad,
        stages: &[(&'static str, Option<u32>)],
    ) -> (StageManager, Rig) {
        let tuning = Tuning::default();
        let (p, rig) = Rig::build(pad, false, false, &tuning);
        let mut mgr = StageManager::new(p, tuning);
        for (name, score) in stages {
            let score = *score;
            mgr.register(name, move |_| Box::new(Fixed(score)));
        }
        (mgr, rig)
    }

    #[test]
    fn test_run_one_records_and_reports() {
        let (mut mgr, rig) = manager_with(MockPad::tapping_a(), &[("Echo", Some(7))]);
        mgr.run_one(0);

        assert_eq!(mgr.scores().get("Echo"), Some(Some(7)));
        assert!(rig.screen.saw("Score: 7"));
        // reset before and after the run blanks both outputs
        assert!(rig.grid.clears() >= 2);
        assert!(rig.speaker.silences() >= 2);
    }

    #[test]
    fn test_run_one_scoreless_says_so() {
        let (mut mgr, rig) = manager_with(MockPad::tapping_a(), &[("Echo", None)]);
        mgr.run_one(0);

        assert_eq!(mgr.scores().get("Echo"), Some(None));
        assert!(rig.screen.saw("No score"));
        assert!(!rig.screen.saw("Score:"));
    }

    #[test]
    fn test_challenge_totals_across_scoreless_runs() {
        let (mut mgr, rig) = manager_with(
            MockPad::tapping_a(),
            &[("First", Some(10)), ("Second", None), ("Third", Some(5))],
        );
        mgr.run_challenge();

        assert!(rig.screen.saw("Total: 15"));
        assert_eq!(
            rig.screen.screens_containing("to continue"),
            3,
            "one continue gate per stage"
        );
        assert!(rig.screen.saw("Challenge complete!"));
        assert_eq!(mgr.scores().get("Second"), Some(None));
        assert_eq!(mgr.scores().total(), 15);
    }

    #[test]
    fn test_menu_runs_stage_then_exits() {
        // gate press, confirm first entry, dismiss the result screen,
        // re-enter through the gate, then two steps down to Exit and
        // confirm
        let pad = MockPad::script(vec![
            (false, false),
            (true, false),
            (false, true),
            (false, false),
            (false, true),
            (false, false),
            (true, false),
            (false, false),
            (true, false),
            (false, false),
            (true, false),
            (false, false),
            (false, true),
        ]);
        let (mut mgr, rig) = manager_with(pad, &[("Echo", Some(7))]);
        mgr.run_menu();

        assert_eq!(mgr.scores().get("Echo"), Some(Some(7)));
        assert!(rig.screen.saw("> Echo"));
        assert!(rig.screen.saw("Thanks for playing!"));
    }

    #[test]
    fn test_menu_exit_with_no_stages() {
        // gate press, one step (Challenge -> Exit), confirm
        let pad = MockPad::script(vec![
            (false, false),
            (true, false),
            (false, false),
            (true, false),
            (false, false),
            (false, true),
        ]);
        let (mut mgr, rig) = manager_with(pad, &[]);
        mgr.run_menu();

        assert!(mgr.scores().is_empty());
        assert!(rig.screen.saw("Thanks for playing!"));
    }
}
