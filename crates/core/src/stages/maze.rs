//! Maze: tilt your way from the start to the exit through three walled
//! layouts, each on its own time budget.
//!
//! Movement is per axis: a wall blocks only the axis that runs into it,
//! so sliding along a wall works. Running out of time on any layout ends
//! the game with the number of layouts already cleared.

use crate::config::Tuning;
use crate::peripherals::{AccelSample, Color, Peripherals};
use crate::round::{countdown, tilt_steps, Cadence, GridPos, RoundTimer};
use crate::stage::Stage;
use crate::{tone, GRID_SIZE};

const WALL: u8 = 1;
const START: u8 = 2;
const EXIT: u8 = 3;

/// Layouts row-major, top row first (printed as seen on the board).
/// 0 free, 1 wall, 2 start, 3 exit.
const MAZES: [[[u8; 5]; 5]; 3] = [
    [
        [0, 0, 0, 0, 3],
        [0, 1, 1, 1, 0],
        [0, 0, 0, 1, 0],
        [1, 1, 0, 1, 0],
        [2, 0, 0, 0, 0],
    ],
    [
        [0, 1, 0, 0, 3],
        [0, 1, 0, 1, 0],
        [0, 1, 0, 1, 0],
        [0, 1, 0, 1, 0],
        [2, 0, 0, 1, 0],
    ],
    [
        [0, 0, 0, 0, 3],
        [0, 1, 1, 1, 1],
        [0, 0, 0, 0, 0],
        [1, 1, 1, 1, 0],
        [2, 0, 0, 0, 0],
    ],
];

type Layout = [[u8; 5]; 5];

fn cell(layout: &Layout, x: u8, y: u8) -> u8 {
    layout[(GRID_SIZE - 1 - y) as usize][x as usize]
}

fn find(layout: &Layout, marker: u8) -> GridPos {
    for y in 0..GRID_SIZE {
        for x in 0..GRID_SIZE {
            if cell(layout, x, y) == marker {
                return GridPos::new(x, y);
            }
        }
    }
    GridPos::CENTER
}

pub struct MazeStage {
    tuning: Tuning,
}

impl MazeStage {
    pub fn new(tuning: &Tuning) -> Self {
        MazeStage { tuning: tuning.clone() }
    }

    fn play(&self, p: &mut Peripherals) -> Option<u32> {
        let zero = super::calibrate_zero(p, &self.tuning);
        countdown(p.screen.as_mut(), p.speaker.as_mut(), p.clock.as_ref(), self.tuning.countdown_from);
        p.screen.clear();

        let mut cleared: u32 = 0;
        for (idx, layout) in MAZES.iter().enumerate() {
            if !self.play_layout(p, layout, idx, zero) {
                tone::play_game_over(p.speaker.as_mut(), p.clock.as_ref());
                p.screen.show_lines(&[
                    "Time's up!",
                    &format!("Mazes cleared: {cleared}"),
                    "",
                    "Press any button",
                ]);
                p.wait_any_press();
                return if cleared == 0 { None } else { Some(cleared) };
            }
            cleared += 1;
            tone::beep(p.speaker.as_mut());
        }

        p.screen.show_lines(&["All mazes cleared!", "", "Press any button"]);
        tone::play_finish(p.speaker.as_mut(), p.clock.as_ref());
        p.wait_any_press();
        Some(cleared)
    }

    /// One layout on its own budget; true when the exit was reached.
    fn play_layout(&self, p: &mut Peripherals, layout: &Layout, idx: usize, zero: AccelSample) -> bool {
        let exit = find(layout, EXIT);
        let mut pos = find(layout, START);
        let timer = RoundTimer::new(self.tuning.maze_level_secs * 1000, p.clock.now_ms());
        let mut status = Cadence::new(self.tuning.display_refresh_ms, 0);
        draw(p, layout, pos);

        loop {
            let now = p.clock.now_ms();
            if timer.expired(now) {
                return false;
            }

            if let Some(s) = super::tilt::sample_or_skip(p) {
                let rel = AccelSample {
                    x: s.x - zero.x,
                    y: s.y - zero.y,
                    z: s.z - zero.z,
                };
                let (dx, dy) = tilt_steps(rel, self.tuning.tilt_sensitivity);
                let next = pos.step_blocked(dx, dy, |x, y| cell(layout, x, y) == WALL);
                if next != pos {
                    pos = next;
                    if pos == exit {
                        return true;
                    }
                    draw(p, layout, pos);
                }
            }

            if status.ready(now) {
                p.screen.show_lines(&[
                    &format!("Maze {}/{}", idx + 1, MAZES.len()),
                    &format!("Time: {}s", timer.remaining_secs(now)),
                ]);
            }
            p.clock.sleep_ms(self.tuning.sensor_poll_ms);
        }
    }
}

fn draw(p: &mut Peripherals, layout: &Layout, pos: GridPos) {
    p.grid.clear();
    for y in 0..GRID_SIZE {
        for x in 0..GRID_SIZE {
            match cell(layout, x, y) {
                WALL => p.grid.set(x, y, Color::RED),
                EXIT => p.grid.set(x, y, Color::GREEN),
                _ => {}
            }
        }
    }
    p.grid.set(pos.x, pos.y, Color::BLUE);
}

impl Stage for MazeStage {
    fn run(&mut self, p: &mut Peripherals) -> Option<u32> {
        if !super::require_accel(p) {
            return None;
        }
        p.screen.show_lines(&[
            "Maze",
            "",
            "Tilt to the green",
            "exit, walls are red",
            "",
            "Press any button",
        ]);
        p.wait_any_press();
        self.play(p)
    }
}
