//! Peripheral collaborator traits and the shared bundle lent to stages.
//!
//! Output sinks ([`TextScreen`], [`LedGrid`], [`Speaker`]) and raw input
//! ports ([`ButtonPad`], [`Joystick`], [`Accelerometer`]) are traits so a
//! frontend can back them with real hardware, a window, or a scripted
//! double. The [`Peripherals`] bundle is owned by the stage manager for the
//! whole session and lent to exactly one active stage at a time; no stage
//! keeps a handle past its own `run`.

use thiserror::Error;

use crate::clock::Clock;
use crate::input::InputSource;
use crate::GRID_SIZE;

/// One RGB LED cell color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    // The fixed palette. Kept dim on purpose; full-brightness white draws
    // too much current on the real matrix.
    pub const OFF: Color = Color::new(0, 0, 0);
    pub const GREEN: Color = Color::new(0, 100, 0);
    pub const BLUE: Color = Color::new(0, 0, 100);
    pub const RED: Color = Color::new(100, 0, 0);
    pub const YELLOW: Color = Color::new(100, 100, 0);
    pub const PURPLE: Color = Color::new(100, 0, 100);
    pub const CYAN: Color = Color::new(0, 100, 100);
    pub const WHITE: Color = Color::new(30, 30, 30);
}

/// Text display. Calls present immediately; there is no deferred flush in
/// this contract, so the physical screen is fully updated when a call
/// returns.
pub trait TextScreen {
    /// Replace the whole screen with the given lines, top to bottom.
    fn show_lines(&mut self, lines: &[&str]);

    /// Draw text at a character cell and present.
    fn show_text(&mut self, text: &str, col: usize, row: usize);

    /// Blank the screen.
    fn clear(&mut self);

    /// Large centered countdown digit (1–3). The default renders block art
    /// through `show_lines`; hardware with a big font can override.
    fn show_big_digit(&mut self, digit: u8) {
        let art: [&str; 5] = match digit {
            3 => ["  ####  ", "      ##", "   ###  ", "      ##", "  ####  "],
            2 => ["  ####  ", "      ##", "  ####  ", "##      ", "  ##### "],
            _ => ["    ##  ", "  ####  ", "    ##  ", "    ##  ", "  ######"],
        };
        self.show_lines(&art);
    }

    /// Ranked list of millisecond times, ascending, as "rank. value s".
    fn show_ranking(&mut self, times_ms: &[u32]) {
        let mut sorted = times_ms.to_vec();
        sorted.sort_unstable();
        let mut lines = vec!["Ranking:".to_string()];
        for (i, t) in sorted.iter().take(crate::SCREEN_ROWS - 1).enumerate() {
            lines.push(format!("{}. {:.2}s", i + 1, *t as f32 / 1000.0));
        }
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        self.show_lines(&refs);
    }
}

/// 5×5 addressable LED matrix. Every mutating call flushes to hardware
/// immediately; multi-cell updates are not atomic and callers batch
/// manually if flicker matters.
pub trait LedGrid {
    /// Light one cell. Out-of-range coordinates are ignored.
    fn set(&mut self, x: u8, y: u8, color: Color);

    /// Extinguish the whole matrix.
    fn clear(&mut self);

    /// Blocking blink of a single cell, used for error/goal emphasis.
    fn flash(&mut self, x: u8, y: u8, color: Color, times: u32, period_ms: u64, clock: &dyn Clock) {
        for _ in 0..times {
            self.set(x, y, color);
            clock.sleep_ms(period_ms);
            self.set(x, y, Color::OFF);
            clock.sleep_ms(period_ms);
        }
    }
}

/// Piezo buzzer. One tone at a time, no polyphony.
pub trait Speaker {
    /// Square tone at `freq_hz`, blocking for the full `ms` duration.
    fn play(&mut self, freq_hz: u32, ms: u64);

    /// Cut any residue immediately (used by the between-stage reset).
    fn silence(&mut self);
}

/// Two push-buttons, A and B. Levels, not edges; edge detection lives in
/// [`InputSource`].
pub trait ButtonPad {
    /// Current (A, B) pressed levels; one raw port read per call.
    fn read(&self) -> (bool, bool);
}

/// Optional analog stick with center press button.
pub trait Joystick {
    /// X deflection, -1.0 (left) .. +1.0 (right), 0.0 centered.
    fn x(&self) -> f32;
    /// Y deflection, -1.0 (toward player) .. +1.0 (away), 0.0 centered.
    fn y(&self) -> f32;
    /// Center button level.
    fn pressed(&self) -> bool;
}

/// Accelerometer reading in g per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Sensor failure taxonomy: absence is decided once at startup and never
/// retried; a failed read skips that sample and the loop goes on.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor not present")]
    NotPresent,
    #[error("sensor read failed: {0}")]
    ReadFailed(String),
}

/// Optional inertial sensor.
pub trait Accelerometer {
    fn sample(&mut self) -> Result<AccelSample, SensorError>;
}

/// Everything a stage is lent for the duration of one `run`.
pub struct Peripherals {
    pub screen: Box<dyn TextScreen>,
    pub grid: Box<dyn LedGrid>,
    pub speaker: Box<dyn Speaker>,
    pub input: InputSource,
    /// `None` when no inertial sensor was found at startup; sensor stages
    /// must show their fallback screen instead of assuming presence.
    pub accel: Option<Box<dyn Accelerometer>>,
    pub clock: Box<dyn Clock>,
}

impl Peripherals {
    pub fn new(
        screen: Box<dyn TextScreen>,
        grid: Box<dyn LedGrid>,
        speaker: Box<dyn Speaker>,
        input: InputSource,
        accel: Option<Box<dyn Accelerometer>>,
        clock: Box<dyn Clock>,
    ) -> Self {
        if accel.is_none() {
            tracing::info!("no inertial sensor, tilt stages will refuse to start");
        }
        Peripherals { screen, grid, speaker, input, accel, clock }
    }

    /// Return every output to its neutral state. Runs before and after
    /// every stage invocation so nothing visual or audible leaks between
    /// games.
    pub fn reset(&mut self) {
        self.speaker.silence();
        self.grid.clear();
        self.screen.clear();
        tracing::debug!("peripherals reset");
    }

    /// Block until a press edge on any source, reporting which.
    pub fn wait_any_press(&mut self) -> crate::input::Press {
        self.input.wait_any_press(self.clock.as_ref())
    }
}

/// True while `(x, y)` addresses a cell on the matrix.
pub fn in_grid(x: u8, y: u8) -> bool {
    x < GRID_SIZE && y < GRID_SIZE
}
