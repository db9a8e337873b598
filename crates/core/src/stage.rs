//! The stage contract, registry entries, and the session score board.

use std::collections::HashMap;

use crate::config::Tuning;
use crate::peripherals::Peripherals;

/// One playable mini-game.
///
/// A stage is built fresh for every invocation, borrows the peripherals
/// only for the duration of `run`, and reports its score, or `None` when
/// the run produced no score (aborted, sensor missing, lost before
/// scoring).
pub trait Stage {
    fn run(&mut self, p: &mut Peripherals) -> Option<u32>;
}

/// Builds a fresh stage instance for one invocation.
pub type StageFactory = Box<dyn Fn(&Tuning) -> Box<dyn Stage>>;

/// Registry entry: menu label plus the factory behind it.
pub struct StageDescriptor {
    pub name: String,
    pub factory: StageFactory,
}

/// Latest score per stage for the session. An entry of `None` records a
/// completed run that produced no score, which is distinct from a score
/// of zero and from never having run.
#[derive(Default)]
pub struct ScoreBoard {
    scores: HashMap<String, Option<u32>>,
}

impl ScoreBoard {
    /// Record the outcome of one run, replacing any earlier one.
    pub fn record(&mut self, name: &str, score: Option<u32>) {
        self.scores.insert(name.to_string(), score);
    }

    /// Outer `None`: the stage never ran. Inner `None`: it ran scoreless.
    pub fn get(&self, name: &str) -> Option<Option<u32>> {
        self.scores.get(name).copied()
    }

    /// Sum over all recorded runs, counting scoreless runs as zero.
    pub fn total(&self) -> u32 {
        self.scores.values().map(|s| s.unwrap_or(0)).sum()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_zero_and_scoreless_are_distinct() {
        let mut board = ScoreBoard::default();
        board.record("memory", Some(0));
        board.record("tilt", None);

        assert_eq!(board.get("memory"), Some(Some(0)));
        assert_eq!(board.get("tilt"), Some(None), "ran but scoreless");
        assert_eq!(board.get("maze"), None, "never ran");
    }

    #[test]
    fn test_total_folds_scoreless_as_zero() {
        let mut board = ScoreBoard::default();
        board.record("reaction", Some(10));
        board.record("tilt", None);
        board.record("maze", Some(5));
        assert_eq!(board.total(), 15);
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn test_record_replaces_earlier_run() {
        let mut board = ScoreBoard::default();
        board.record("memory", Some(3));
        board.record("memory", Some(7));
        assert_eq!(board.get("memory"), Some(Some(7)));
        assert_eq!(board.total(), 7);
    }
}
