//! Matrix Arcade desktop simulator v0.3.0.
//!
//! Renders the arcade board in a window: the 5×5 LED matrix on top, the
//! text display underneath, square-wave audio through the default output
//! device, and input from keyboard or gamepad.
//!
//! Keys: Z=A X=B, arrows=joystick, Enter=stick press, WASD=tilt,
//! Esc=quit.
//!
//! The core is written against a blocking clock; every sleep in the game
//! logic funnels through [`SimClock::sleep_ms`], which pumps the window
//! and gamepad in ~16ms slices. That keeps the whole simulator on one
//! thread with no event loop of its own.

use arcade_core::peripherals::{
    AccelSample, Accelerometer, ButtonPad, Joystick, LedGrid, SensorError, Speaker, TextScreen,
};
use arcade_core::stages::register_all;
use arcade_core::{Clock, Color, InputSource, Peripherals, StageManager, Tuning};
use arcade_core::{GRID_SIZE, SCREEN_COLS, SCREEN_ROWS};
use gilrs::{Axis, Button as GilrsButton, Event as GilrsEvent, EventType, Gilrs};
use minifb::{Key, Scale, Window, WindowOptions};
use std::cell::RefCell;
use std::env;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod font;

/// Audio output sample rate in Hz
const AUDIO_SAMPLE_RATE: u32 = 44100;
/// Square wave amplitude (0.0–1.0)
const AUDIO_VOLUME: f32 = 0.15;

// Logical pixel layout: LED matrix above, text display below.
const MARGIN: usize = 8;
const CELL: usize = 24;
const CELL_GAP: usize = 6;
const GRID_PX: usize = GRID_SIZE as usize * CELL + (GRID_SIZE as usize - 1) * CELL_GAP;
const CHAR_W: usize = font::GLYPH_W + 1;
const CHAR_H: usize = font::GLYPH_H + 2;
const WIN_W: usize = GRID_PX + 2 * MARGIN;
const WIN_H: usize = GRID_PX + SCREEN_ROWS * CHAR_H + 3 * MARGIN;

const TEXT_RGB: u32 = 0x00c8c8c8;
const CELL_OFF_RGB: u32 = 0x00141414;

// ─── Board state ────────────────────────────────────────────────────────────

/// Everything behind the simulated peripherals: the window, the pixel
/// buffer, the LED and text contents, and the merged gamepad state.
struct Board {
    window: Window,
    buf: Vec<u32>,
    lines: Vec<String>,
    cells: [[Color; GRID_SIZE as usize]; GRID_SIZE as usize],
    gilrs: Option<Gilrs>,
    gp: GamepadState,
}

impl Board {
    fn new(scale: Scale) -> Self {
        let window = Window::new(
            "Matrix Arcade",
            WIN_W,
            WIN_H,
            WindowOptions { scale, ..Default::default() },
        )
        .expect("Failed to create window");

        Board {
            window,
            buf: vec![0; WIN_W * WIN_H],
            lines: Vec::new(),
            cells: [[Color::OFF; GRID_SIZE as usize]; GRID_SIZE as usize],
            gilrs: init_gamepad(),
            gp: GamepadState::default(),
        }
    }

    /// One slice of the outside world: gamepad events, quit handling, and
    /// a redraw. Called from inside every sleep.
    fn pump(&mut self) {
        if let Some(ref mut g) = self.gilrs {
            poll_gamepad(g, &mut self.gp);
        }
        if !self.window.is_open() || self.window.is_key_down(Key::Escape) {
            tracing::info!("window closed, shutting down");
            std::process::exit(0);
        }
        self.redraw();
    }

    fn redraw(&mut self) {
        self.buf.fill(0);
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                self.draw_cell(x, y);
            }
        }
        let lines = std::mem::take(&mut self.lines);
        for (row, line) in lines.iter().take(SCREEN_ROWS).enumerate() {
            self.draw_line(line, 0, row);
        }
        self.lines = lines;
        self.window
            .update_with_buffer(&self.buf, WIN_W, WIN_H)
            .expect("Failed to present frame");
    }

    /// One LED cell; board y grows upward, screen y grows downward.
    fn draw_cell(&mut self, x: u8, y: u8) {
        let color = self.cells[y as usize][x as usize];
        let rgb = if color == Color::OFF { CELL_OFF_RGB } else { led_rgb(color) };
        let px = MARGIN + x as usize * (CELL + CELL_GAP);
        let py = MARGIN + (GRID_SIZE - 1 - y) as usize * (CELL + CELL_GAP);
        for dy in 0..CELL {
            let base = (py + dy) * WIN_W + px;
            self.buf[base..base + CELL].fill(rgb);
        }
    }

    fn draw_line(&mut self, text: &str, col: usize, row: usize) {
        let px0 = MARGIN + col * CHAR_W;
        let py0 = 2 * MARGIN + GRID_PX + row * CHAR_H;
        for (i, c) in text.chars().take(SCREEN_COLS - col).enumerate() {
            let rows = font::glyph(c);
            for (gy, bits) in rows.iter().enumerate() {
                for gx in 0..font::GLYPH_W {
                    if bits & (1 << (font::GLYPH_W - 1 - gx)) != 0 {
                        let px = px0 + i * CHAR_W + gx;
                        let py = py0 + gy;
                        self.buf[py * WIN_W + px] = TEXT_RGB;
                    }
                }
            }
        }
    }

    fn write_at(&mut self, text: &str, col: usize, row: usize) {
        if row >= SCREEN_ROWS {
            return;
        }
        while self.lines.len() <= row {
            self.lines.push(String::new());
        }
        let line = &mut self.lines[row];
        while line.chars().count() < col {
            line.push(' ');
        }
        let kept: String = line.chars().take(col).collect();
        *line = kept + text;
    }

    // Keyboard levels merged with whatever the gamepad last reported.

    fn key(&self, k: Key) -> bool {
        self.window.is_key_down(k)
    }

    fn stick_x(&self) -> f32 {
        let kb = axis_from_keys(self.key(Key::Right), self.key(Key::Left));
        strongest(kb, self.gp.stick_x)
    }

    fn stick_y(&self) -> f32 {
        let kb = axis_from_keys(self.key(Key::Up), self.key(Key::Down));
        strongest(kb, self.gp.stick_y)
    }

    fn tilt_x(&self) -> f32 {
        let kb = axis_from_keys(self.key(Key::D), self.key(Key::A));
        strongest(kb, self.gp.tilt_x)
    }

    fn tilt_y(&self) -> f32 {
        let kb = axis_from_keys(self.key(Key::W), self.key(Key::S));
        strongest(kb, self.gp.tilt_y)
    }
}

type Shared = Rc<RefCell<Board>>;

fn axis_from_keys(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

fn strongest(a: f32, b: f32) -> f32 {
    if a.abs() >= b.abs() {
        a
    } else {
        b
    }
}

/// Map the dim LED palette onto full-range screen pixels.
fn led_rgb(c: Color) -> u32 {
    let boost = |v: u8| (v as u32 * 255 / 100).min(255);
    (boost(c.r) << 16) | (boost(c.g) << 8) | boost(c.b)
}

/// Sleep in pump-sized slices so the window stays live during blocking
/// game logic.
fn pump_sleep(board: &Shared, ms: u64) {
    let deadline = Instant::now() + Duration::from_millis(ms);
    loop {
        board.borrow_mut().pump();
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        let left = deadline - now;
        std::thread::sleep(left.min(Duration::from_millis(16)));
    }
}

// ─── Gamepad ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct GamepadState {
    a: bool,
    b: bool,
    stick_press: bool,
    stick_x: f32,
    stick_y: f32,
    tilt_x: f32,
    tilt_y: f32,
}

fn init_gamepad() -> Option<Gilrs> {
    match Gilrs::new() {
        Ok(gilrs) => {
            for (_, gp) in gilrs.gamepads() {
                tracing::info!("gamepad: \"{}\"", gp.name());
            }
            Some(gilrs)
        }
        Err(e) => {
            tracing::warn!("gamepad unavailable: {e}");
            None
        }
    }
}

fn poll_gamepad(gilrs: &mut Gilrs, state: &mut GamepadState) {
    while let Some(GilrsEvent { event, .. }) = gilrs.next_event() {
        match event {
            EventType::ButtonPressed(b, _) => apply_button(state, b, true),
            EventType::ButtonReleased(b, _) => apply_button(state, b, false),
            EventType::AxisChanged(a, v, _) => apply_axis(state, a, v),
            EventType::Disconnected => *state = GamepadState::default(),
            _ => {}
        }
    }
}

fn apply_button(state: &mut GamepadState, btn: GilrsButton, pressed: bool) {
    match btn {
        GilrsButton::South | GilrsButton::LeftTrigger => state.a = pressed,
        GilrsButton::East | GilrsButton::RightTrigger => state.b = pressed,
        GilrsButton::LeftThumb => state.stick_press = pressed,
        GilrsButton::DPadUp => state.stick_y = if pressed { 1.0 } else { 0.0 },
        GilrsButton::DPadDown => state.stick_y = if pressed { -1.0 } else { 0.0 },
        GilrsButton::DPadLeft => state.stick_x = if pressed { -1.0 } else { 0.0 },
        GilrsButton::DPadRight => state.stick_x = if pressed { 1.0 } else { 0.0 },
        _ => {}
    }
}

fn apply_axis(state: &mut GamepadState, axis: Axis, value: f32) {
    match axis {
        Axis::LeftStickX => state.stick_x = value,
        Axis::LeftStickY => state.stick_y = value,
        Axis::RightStickX => state.tilt_x = value,
        Axis::RightStickY => state.tilt_y = value,
        _ => {}
    }
}

// ─── Audio ──────────────────────────────────────────────────────────────────

/// Endless square wave; frequency 0 is silence.
struct SquareSource {
    freq: Arc<AtomicU32>,
    sample_rate: u32,
    phase: f32,
}

impl Iterator for SquareSource {
    type Item = f32;
    fn next(&mut self) -> Option<f32> {
        let freq = self.freq.load(Ordering::Relaxed);
        if freq == 0 {
            self.phase = 0.0;
            return Some(0.0);
        }
        let s = if self.phase < 0.5 { AUDIO_VOLUME } else { -AUDIO_VOLUME };
        self.phase += freq as f32 / self.sample_rate as f32;
        self.phase %= 1.0;
        Some(s)
    }
}

impl rodio::Source for SquareSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }
    fn channels(&self) -> u16 {
        1
    }
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

fn setup_audio(freq: Arc<AtomicU32>) -> Option<(rodio::OutputStream, rodio::OutputStreamHandle, rodio::Sink)> {
    match rodio::OutputStream::try_default() {
        Ok((stream, handle)) => match rodio::Sink::try_new(&handle) {
            Ok(sink) => {
                sink.append(SquareSource { freq, sample_rate: AUDIO_SAMPLE_RATE, phase: 0.0 });
                Some((stream, handle, sink))
            }
            Err(e) => {
                tracing::warn!("audio sink: {e}");
                None
            }
        },
        Err(e) => {
            tracing::warn!("audio device: {e}");
            None
        }
    }
}

// ─── Peripheral implementations ─────────────────────────────────────────────

struct SimScreen(Shared);

impl TextScreen for SimScreen {
    fn show_lines(&mut self, lines: &[&str]) {
        let mut b = self.0.borrow_mut();
        b.lines = lines.iter().map(|s| s.to_string()).collect();
        b.redraw();
    }

    fn show_text(&mut self, text: &str, col: usize, row: usize) {
        let mut b = self.0.borrow_mut();
        b.write_at(text, col, row);
        b.redraw();
    }

    fn clear(&mut self) {
        let mut b = self.0.borrow_mut();
        b.lines.clear();
        b.redraw();
    }
}

struct SimGrid(Shared);

impl LedGrid for SimGrid {
    fn set(&mut self, x: u8, y: u8, color: Color) {
        if x >= GRID_SIZE || y >= GRID_SIZE {
            return;
        }
        let mut b = self.0.borrow_mut();
        b.cells[y as usize][x as usize] = color;
        b.redraw();
    }

    fn clear(&mut self) {
        let mut b = self.0.borrow_mut();
        b.cells = [[Color::OFF; GRID_SIZE as usize]; GRID_SIZE as usize];
        b.redraw();
    }
}

struct SimSpeaker {
    board: Shared,
    freq: Arc<AtomicU32>,
    _audio: Option<(rodio::OutputStream, rodio::OutputStreamHandle, rodio::Sink)>,
}

impl SimSpeaker {
    fn new(board: Shared, mute: bool) -> Self {
        let freq = Arc::new(AtomicU32::new(0));
        let _audio = if mute { None } else { setup_audio(freq.clone()) };
        SimSpeaker { board, freq, _audio }
    }
}

impl Speaker for SimSpeaker {
    fn play(&mut self, freq_hz: u32, ms: u64) {
        self.freq.store(freq_hz, Ordering::Relaxed);
        pump_sleep(&self.board, ms);
        self.freq.store(0, Ordering::Relaxed);
    }

    fn silence(&mut self) {
        self.freq.store(0, Ordering::Relaxed);
    }
}

struct SimPad(Shared);

impl ButtonPad for SimPad {
    fn read(&self) -> (bool, bool) {
        let b = self.0.borrow();
        (b.key(Key::Z) || b.gp.a, b.key(Key::X) || b.gp.b)
    }
}

struct SimStick(Shared);

impl Joystick for SimStick {
    fn x(&self) -> f32 {
        self.0.borrow().stick_x()
    }

    fn y(&self) -> f32 {
        self.0.borrow().stick_y()
    }

    fn pressed(&self) -> bool {
        let b = self.0.borrow();
        b.key(Key::Enter) || b.gp.stick_press
    }
}

struct SimAccel(Shared);

impl Accelerometer for SimAccel {
    fn sample(&mut self) -> Result<AccelSample, SensorError> {
        let b = self.0.borrow();
        Ok(AccelSample { x: b.tilt_x(), y: b.tilt_y(), z: 1.0 })
    }
}

struct SimClock {
    board: Shared,
    origin: Instant,
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        pump_sleep(&self.board, ms);
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

const STAGE_NAMES: [&str; 5] = ["Reaction", "Memory", "Tilt Run", "Maze", "Balance"];

fn usage(program: &str) {
    eprintln!("Matrix Arcade simulator v0.3.0");
    eprintln!("Usage: {} [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scale N     Window scale 1/2/4/8 (default 2)");
    eprintln!("  --mute        Disable audio");
    eprintln!("  --no-sensor   Simulate a board without the motion sensor");
    eprintln!("  --list        Print the stage catalog and exit");
    eprintln!();
    eprintln!("Keys: Z=A X=B Arrows=joystick Enter=stick press");
    eprintln!("      WASD=tilt Esc=quit");
    eprintln!("Gamepad: left stick=joystick right stick=tilt South=A East=B");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage(&args[0]);
        return;
    }
    if args.iter().any(|a| a == "--list") {
        for name in STAGE_NAMES {
            println!("{name}");
        }
        return;
    }
    let mute = args.iter().any(|a| a == "--mute");
    let no_sensor = args.iter().any(|a| a == "--no-sensor");
    let scale = match args
        .iter()
        .position(|a| a == "--scale")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(2)
    {
        1 => Scale::X1,
        4 => Scale::X4,
        8 => Scale::X8,
        _ => Scale::X2,
    };

    let tuning = Tuning::default();
    let board: Shared = Rc::new(RefCell::new(Board::new(scale)));

    let input = InputSource::new(
        Box::new(SimPad(board.clone())),
        Some(Box::new(SimStick(board.clone()))),
        &tuning,
    );
    let accel: Option<Box<dyn Accelerometer>> = if no_sensor {
        None
    } else {
        Some(Box::new(SimAccel(board.clone())))
    };
    let peripherals = Peripherals::new(
        Box::new(SimScreen(board.clone())),
        Box::new(SimGrid(board.clone())),
        Box::new(SimSpeaker::new(board.clone(), mute)),
        input,
        accel,
        Box::new(SimClock { board: board.clone(), origin: Instant::now() }),
    );

    let mut mgr = StageManager::new(peripherals, tuning);
    register_all(&mut mgr);
    mgr.run_menu();

    let total = mgr.scores().total();
    if !mgr.scores().is_empty() {
        println!("Session total: {total}");
    }
}
