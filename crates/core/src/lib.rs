//! # arcade-core
//!
//! Hardware-independent game core for a small arcade board built around a
//! 5×5 addressable RGB LED matrix, a 128×64 text display, a piezo buzzer,
//! two push-buttons, and (optionally) an analog joystick and an
//! accelerometer.
//!
//! Everything that touches real hardware sits behind a trait in
//! [`peripherals`]; a frontend (desktop simulator, embedded target)
//! supplies the implementations and hands them to the
//! [`manager::StageManager`], which owns them for the whole session and
//! lends them to one active stage at a time.
//!
//! ## Architecture
//!
//! - [`clock`]: monotonic millisecond tick source and cooperative sleeps
//! - [`config`]: the single [`Tuning`] surface for timings and thresholds
//! - [`peripherals`]: output sinks, raw input ports, the shared bundle
//! - [`input`]: debounced, edge-detected [`InputEvent`] layer
//! - [`round`]: countdown, cadences, calibration, tilt mapping, grid moves
//! - [`menu`]: paginated selectable menu with wrap-around navigation
//! - [`stage`]: the [`Stage`] contract, registry entries, session scores
//! - [`manager`]: top-level control loop (menu, dispatch, challenge mode)
//! - [`stages`]: the mini-game catalog
//! - [`tone`]: note table and canned jingles
//! - [`mocks`]: scriptable doubles for every peripheral trait
//!
//! All waiting is cooperative polling with short sleeps; there is no thread
//! or interrupt anywhere in this crate. Time comparisons go through
//! [`clock::elapsed`], which never underflows, even across a tick-counter
//! wrap.

pub mod clock;
pub mod config;
pub mod input;
pub mod manager;
pub mod menu;
pub mod mocks;
pub mod peripherals;
pub mod round;
pub mod stage;
pub mod stages;
pub mod tone;

pub use clock::{elapsed, Clock, SystemClock};
pub use config::Tuning;
pub use input::{InputEvent, InputSource, Press};
pub use manager::StageManager;
pub use peripherals::{Color, Peripherals};
pub use stage::{ScoreBoard, Stage, StageDescriptor};

/// LED matrix edge length in cells
pub const GRID_SIZE: u8 = 5;

/// Text display width in characters (128 px / 8 px glyph cell)
pub const SCREEN_COLS: usize = 16;
/// Text display height in rows (64 px / 10 px line pitch)
pub const SCREEN_ROWS: usize = 6;
