//! The mini-game catalog.

pub mod balance;
pub mod maze;
pub mod memory;
pub mod reaction;
pub mod tilt;

pub use balance::BalanceStage;
pub use maze::MazeStage;
pub use memory::MemoryStage;
pub use reaction::ReactionStage;
pub use tilt::TiltStage;

use crate::config::Tuning;
use crate::manager::StageManager;
use crate::peripherals::{AccelSample, Peripherals};
use crate::round::calibrate;

/// Register the full catalog in menu order.
pub fn register_all(mgr: &mut StageManager) {
    mgr.register("Reaction", |t| Box::new(ReactionStage::new(t)));
    mgr.register("Memory", |t| Box::new(MemoryStage::new(t)));
    mgr.register("Tilt Run", |t| Box::new(TiltStage::new(t)));
    mgr.register("Maze", |t| Box::new(MazeStage::new(t)));
    mgr.register("Balance", |t| Box::new(BalanceStage::new(t)));
}

/// Gate for stages that need the motion sensor. Shows the fallback screen
/// and returns false when the sensor was absent at startup.
pub(crate) fn require_accel(p: &mut Peripherals) -> bool {
    if p.accel.is_some() {
        return true;
    }
    tracing::warn!("stage refused, no motion sensor");
    p.screen.show_lines(&[
        "Sensor not found",
        "",
        "This game needs",
        "the motion sensor",
        "",
        "Press any button",
    ]);
    p.wait_any_press();
    false
}

/// Averaged zero reference for the tilt stages, with the hold-still
/// prompt.
pub(crate) fn calibrate_zero(p: &mut Peripherals, tuning: &Tuning) -> AccelSample {
    p.screen.show_lines(&["Hold the board", "flat and still..."]);
    match p.accel.as_mut() {
        Some(accel) => calibrate(
            accel.as_mut(),
            p.clock.as_ref(),
            tuning.calibration_samples,
            tuning.calibration_interval_ms,
        ),
        None => AccelSample::default(),
    }
}
