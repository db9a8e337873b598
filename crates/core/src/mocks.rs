//! Scriptable doubles for every peripheral trait plus a manually-advanced
//! clock.
//!
//! All doubles use interior mutability and also implement their trait for
//! `Rc<Self>`, so a test can keep a handle while the same double sits boxed
//! inside a [`Peripherals`](crate::peripherals::Peripherals) bundle.
//! Public (not `cfg(test)`) so frontends can run headless self-checks with
//! scripted input.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::clock::Clock;
use crate::config::Tuning;
use crate::input::InputSource;
use crate::peripherals::{
    AccelSample, Accelerometer, ButtonPad, Color, Joystick, LedGrid, Peripherals, SensorError,
    Speaker, TextScreen,
};

// ─── Clock ──────────────────────────────────────────────────────────────────

/// Clock whose time only moves when something sleeps (or the test advances
/// it), making every timing property deterministic.
#[derive(Default)]
pub struct MockClock {
    now: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        MockClock { now: Cell::new(0) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

impl Clock for Rc<MockClock> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn sleep_ms(&self, ms: u64) {
        (**self).sleep_ms(ms);
    }
}

// ─── Output sinks ───────────────────────────────────────────────────────────

/// Records every full-screen replace and text draw.
#[derive(Default)]
pub struct MockScreen {
    screens: RefCell<Vec<Vec<String>>>,
    clears: Cell<u32>,
}

impl MockScreen {
    pub fn screens(&self) -> Vec<Vec<String>> {
        self.screens.borrow().clone()
    }

    pub fn last(&self) -> Option<Vec<String>> {
        self.screens.borrow().last().cloned()
    }

    /// True if any recorded line contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.screens
            .borrow()
            .iter()
            .flatten()
            .any(|l| l.contains(needle))
    }

    /// Number of recorded screens with at least one line containing
    /// `needle`.
    pub fn screens_containing(&self, needle: &str) -> usize {
        self.screens
            .borrow()
            .iter()
            .filter(|s| s.iter().any(|l| l.contains(needle)))
            .count()
    }

    pub fn clears(&self) -> u32 {
        self.clears.get()
    }

    fn push(&self, lines: Vec<String>) {
        self.screens.borrow_mut().push(lines);
    }
}

impl TextScreen for MockScreen {
    fn show_lines(&mut self, lines: &[&str]) {
        self.push(lines.iter().map(|s| s.to_string()).collect());
    }

    fn show_text(&mut self, text: &str, col: usize, row: usize) {
        self.push(vec![format!("@{},{} {}", col, row, text)]);
    }

    fn clear(&mut self) {
        self.clears.set(self.clears.get() + 1);
    }
}

impl TextScreen for Rc<MockScreen> {
    fn show_lines(&mut self, lines: &[&str]) {
        self.push(lines.iter().map(|s| s.to_string()).collect());
    }

    fn show_text(&mut self, text: &str, col: usize, row: usize) {
        self.push(vec![format!("@{},{} {}", col, row, text)]);
    }

    fn clear(&mut self) {
        self.clears.set(self.clears.get() + 1);
    }
}

/// Tracks the currently-lit cells; `Color::OFF` extinguishes.
#[derive(Default)]
pub struct MockGrid {
    cells: RefCell<HashMap<(u8, u8), Color>>,
    clears: Cell<u32>,
}

impl MockGrid {
    pub fn get(&self, x: u8, y: u8) -> Option<Color> {
        self.cells.borrow().get(&(x, y)).copied()
    }

    /// Number of cells currently lit.
    pub fn lit(&self) -> usize {
        self.cells.borrow().len()
    }

    pub fn clears(&self) -> u32 {
        self.clears.get()
    }

    fn put(&self, x: u8, y: u8, color: Color) {
        if !crate::peripherals::in_grid(x, y) {
            return;
        }
        let mut cells = self.cells.borrow_mut();
        if color == Color::OFF {
            cells.remove(&(x, y));
        } else {
            cells.insert((x, y), color);
        }
    }
}

impl LedGrid for MockGrid {
    fn set(&mut self, x: u8, y: u8, color: Color) {
        self.put(x, y, color);
    }

    fn clear(&mut self) {
        self.cells.borrow_mut().clear();
        self.clears.set(self.clears.get() + 1);
    }
}

impl LedGrid for Rc<MockGrid> {
    fn set(&mut self, x: u8, y: u8, color: Color) {
        self.put(x, y, color);
    }

    fn clear(&mut self) {
        self.cells.borrow_mut().clear();
        self.clears.set(self.clears.get() + 1);
    }
}

/// Records every tone; never blocks.
#[derive(Default)]
pub struct MockSpeaker {
    tones: RefCell<Vec<(u32, u64)>>,
    silences: Cell<u32>,
}

impl MockSpeaker {
    pub fn tones(&self) -> Vec<(u32, u64)> {
        self.tones.borrow().clone()
    }

    pub fn silences(&self) -> u32 {
        self.silences.get()
    }
}

impl Speaker for MockSpeaker {
    fn play(&mut self, freq_hz: u32, ms: u64) {
        self.tones.borrow_mut().push((freq_hz, ms));
    }

    fn silence(&mut self) {
        self.silences.set(self.silences.get() + 1);
    }
}

impl Speaker for Rc<MockSpeaker> {
    fn play(&mut self, freq_hz: u32, ms: u64) {
        self.tones.borrow_mut().push((freq_hz, ms));
    }

    fn silence(&mut self) {
        self.silences.set(self.silences.get() + 1);
    }
}

// ─── Input ports ────────────────────────────────────────────────────────────

/// Button pad fed from a scripted sequence of (A, B) levels, one entry per
/// raw read. A finite script holds its last entry forever; a cycling
/// script repeats.
pub struct MockPad {
    seq: Vec<(bool, bool)>,
    idx: Cell<usize>,
    looping: bool,
}

impl MockPad {
    /// Play `seq` once, then hold the final levels.
    pub fn script(seq: Vec<(bool, bool)>) -> Self {
        MockPad { seq, idx: Cell::new(0), looping: false }
    }

    /// Repeat `seq` forever.
    pub fn cycle(seq: Vec<(bool, bool)>) -> Self {
        MockPad { seq, idx: Cell::new(0), looping: true }
    }

    /// Never pressed.
    pub fn idle() -> Self {
        Self::script(vec![(false, false)])
    }

    /// Endless release/press alternation on A: one press edge every other
    /// read.
    pub fn tapping_a() -> Self {
        Self::cycle(vec![(false, false), (true, false)])
    }

    /// Endless release/press alternation on B.
    pub fn tapping_b() -> Self {
        Self::cycle(vec![(false, false), (false, true)])
    }

    fn step(&self) -> (bool, bool) {
        if self.seq.is_empty() {
            return (false, false);
        }
        let i = self.idx.get();
        let v = self.seq[i % self.seq.len()];
        if self.looping {
            self.idx.set((i + 1) % self.seq.len());
        } else if i + 1 < self.seq.len() {
            self.idx.set(i + 1);
        }
        v
    }
}

impl ButtonPad for MockPad {
    fn read(&self) -> (bool, bool) {
        self.step()
    }
}

impl ButtonPad for Rc<MockPad> {
    fn read(&self) -> (bool, bool) {
        self.step()
    }
}

/// Joystick whose axes and center button a test sets directly.
#[derive(Default)]
pub struct MockJoystick {
    x: Cell<f32>,
    y: Cell<f32>,
    center: Cell<bool>,
}

impl MockJoystick {
    pub fn set(&self, x: f32, y: f32) {
        self.x.set(x);
        self.y.set(y);
    }

    pub fn set_center(&self, pressed: bool) {
        self.center.set(pressed);
    }
}

impl Joystick for MockJoystick {
    fn x(&self) -> f32 {
        self.x.get()
    }

    fn y(&self) -> f32 {
        self.y.get()
    }

    fn pressed(&self) -> bool {
        self.center.get()
    }
}

impl Joystick for Rc<MockJoystick> {
    fn x(&self) -> f32 {
        (**self).x()
    }

    fn y(&self) -> f32 {
        (**self).y()
    }

    fn pressed(&self) -> bool {
        (**self).pressed()
    }
}

/// Accelerometer fed from a scripted queue of results; once the queue
/// drains it repeats a settable steady level (default: flat, 1 g on Z).
pub struct MockAccel {
    queue: RefCell<VecDeque<Result<AccelSample, SensorError>>>,
    level: Cell<AccelSample>,
}

impl Default for MockAccel {
    fn default() -> Self {
        MockAccel {
            queue: RefCell::new(VecDeque::new()),
            level: Cell::new(AccelSample { x: 0.0, y: 0.0, z: 1.0 }),
        }
    }
}

impl MockAccel {
    pub fn push(&self, r: Result<AccelSample, SensorError>) {
        self.queue.borrow_mut().push_back(r);
    }

    pub fn push_level(&self, x: f32, y: f32, z: f32) {
        self.push(Ok(AccelSample { x, y, z }));
    }

    pub fn push_failure(&self) {
        self.push(Err(SensorError::ReadFailed("scripted".into())));
    }

    /// Steady reading returned once the queue is empty.
    pub fn set_level(&self, x: f32, y: f32, z: f32) {
        self.level.set(AccelSample { x, y, z });
    }

    fn next(&self) -> Result<AccelSample, SensorError> {
        match self.queue.borrow_mut().pop_front() {
            Some(r) => r,
            None => Ok(self.level.get()),
        }
    }
}

impl Accelerometer for MockAccel {
    fn sample(&mut self) -> Result<AccelSample, SensorError> {
        self.next()
    }
}

impl Accelerometer for Rc<MockAccel> {
    fn sample(&mut self) -> Result<AccelSample, SensorError> {
        self.next()
    }
}

// ─── Full rig ───────────────────────────────────────────────────────────────

/// Handles to every double inside a fully mocked [`Peripherals`] bundle.
///
/// The bundle owns one `Rc` clone of each double; the rig keeps the other,
/// so a test can script input and inspect output while the bundle is in
/// use.
pub struct Rig {
    pub screen: Rc<MockScreen>,
    pub grid: Rc<MockGrid>,
    pub speaker: Rc<MockSpeaker>,
    pub clock: Rc<MockClock>,
    pub stick: Option<Rc<MockJoystick>>,
    pub accel: Option<Rc<MockAccel>>,
}

impl Rig {
    pub fn build(
        pad: MockPad,
        with_stick: bool,
        with_accel: bool,
        tuning: &Tuning,
    ) -> (Peripherals, Rig) {
        let screen = Rc::new(MockScreen::default());
        let grid = Rc::new(MockGrid::default());
        let speaker = Rc::new(MockSpeaker::default());
        let clock = Rc::new(MockClock::new());
        let stick = with_stick.then(|| Rc::new(MockJoystick::default()));
        let accel = with_accel.then(|| Rc::new(MockAccel::default()));
        let input = InputSource::new(
            Box::new(pad),
            stick.clone().map(|s| Box::new(s) as Box<dyn Joystick>),
            tuning,
        );
        let bundle = Peripherals::new(
            Box::new(screen.clone()),
            Box::new(grid.clone()),
            Box::new(speaker.clone()),
            input,
            accel.clone().map(|a| Box::new(a) as Box<dyn Accelerometer>),
            Box::new(clock.clone()),
        );
        (bundle, Rig { screen, grid, speaker, clock, stick, accel })
    }
}
