//! The single tuning surface for every timing and threshold constant.
//!
//! Debounce interval, joystick dead zone, and tilt sensitivity apply
//! uniformly to every stage; per-stage budgets (round lengths, trial
//! counts) live here too so a frontend can adjust difficulty in one place.

/// Session-wide tuning. `Default` gives the values the games were balanced
/// for.
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Minimum interval between accepted repeats of the same directional
    /// event while the stick is held.
    pub debounce_ms: u64,
    /// Stick deflection magnitude (0.0–1.0) treated as centered. Readings
    /// exactly at the threshold count as inside the dead zone.
    pub dead_zone: f32,
    /// Tilt band half-width in g; readings inside `±tilt_sensitivity`
    /// produce no movement.
    pub tilt_sensitivity: f32,
    /// Countdown start value (N, N-1, .. 1 at one-second cadence).
    pub countdown_from: u8,
    /// Idle sleep between polls while waiting for a press.
    pub press_poll_ms: u64,
    /// Coarse cadence of the in-round status display refresh.
    pub display_refresh_ms: u64,
    /// Fine cadence of sensor/input sampling inside a round.
    pub sensor_poll_ms: u64,
    /// Menu rows visible at once.
    pub menu_page_size: usize,
    /// Samples averaged into the zero reference during calibration.
    pub calibration_samples: u32,
    /// Interval between calibration samples.
    pub calibration_interval_ms: u64,

    // Per-stage budgets
    /// Reaction: rounds per game.
    pub reaction_rounds: u32,
    /// Reaction: how long a lit LED waits for a press.
    pub reaction_window_ms: u64,
    /// Memory: longest sequence to reach.
    pub memory_max_level: u32,
    /// Tilt: round length in seconds.
    pub tilt_round_secs: u64,
    /// Maze: time budget per level in seconds.
    pub maze_level_secs: u64,
    /// Balance: round length in seconds.
    pub balance_round_secs: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            debounce_ms: 300,
            dead_zone: 0.35,
            tilt_sensitivity: 0.3,
            countdown_from: 3,
            press_poll_ms: 10,
            display_refresh_ms: 500,
            sensor_poll_ms: 200,
            menu_page_size: 3,
            calibration_samples: 10,
            calibration_interval_ms: 100,
            reaction_rounds: 3,
            reaction_window_ms: 1000,
            memory_max_level: 10,
            tilt_round_secs: 30,
            maze_level_secs: 20,
            balance_round_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_sane() {
        let t = Tuning::default();
        assert_eq!(t.menu_page_size, 3);
        assert_eq!(t.debounce_ms, 300);
        assert!(t.dead_zone > 0.0 && t.dead_zone < 1.0);
        assert!(t.tilt_sensitivity > 0.0);
        assert!(t.countdown_from >= 1);
    }
}
