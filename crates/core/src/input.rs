//! Edge-detected, debounced input events on top of the raw ports.
//!
//! Raw peripherals report levels; this layer turns them into discrete
//! [`InputEvent`]s. Buttons fire on the press edge only. Stick deflection
//! outside the dead zone maps to a direction on the strongest axis, and
//! [`InputSource::poll_debounced`] rate-limits repeats of the same
//! direction while the stick is held, so one push is one menu step.
//!
//! Joystick absence is decided once at construction; a source built
//! without a stick navigates on buttons alone for the whole session.

use crate::clock::{elapsed, Clock};
use crate::config::Tuning;
use crate::peripherals::{ButtonPad, Joystick};

/// One discrete input occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Up,
    Down,
    Left,
    Right,
    /// Joystick center press.
    Confirm,
    ButtonA,
    ButtonB,
}

impl InputEvent {
    pub fn is_directional(self) -> bool {
        matches!(
            self,
            InputEvent::Up | InputEvent::Down | InputEvent::Left | InputEvent::Right
        )
    }
}

/// Which control ended a blocking wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    A,
    B,
    Center,
}

/// Owns the raw input ports and all edge/debounce state.
pub struct InputSource {
    pad: Box<dyn ButtonPad>,
    stick: Option<Box<dyn Joystick>>,
    dead_zone: f32,
    debounce_ms: u64,
    press_poll_ms: u64,
    prev_a: bool,
    prev_b: bool,
    prev_center: bool,
    last_dir: Option<InputEvent>,
    last_dir_at: u64,
}

impl InputSource {
    pub fn new(pad: Box<dyn ButtonPad>, stick: Option<Box<dyn Joystick>>, tuning: &Tuning) -> Self {
        if stick.is_none() {
            tracing::info!("no joystick, navigation falls back to buttons only");
        }
        InputSource {
            pad,
            stick,
            dead_zone: tuning.dead_zone,
            debounce_ms: tuning.debounce_ms,
            press_poll_ms: tuning.press_poll_ms,
            prev_a: false,
            prev_b: false,
            prev_center: false,
            last_dir: None,
            last_dir_at: 0,
        }
    }

    pub fn has_joystick(&self) -> bool {
        self.stick.is_some()
    }

    /// Current A level. One raw pad read; no edge state is touched.
    pub fn a_down(&self) -> bool {
        self.pad.read().0
    }

    /// Current B level.
    pub fn b_down(&self) -> bool {
        self.pad.read().1
    }

    /// One sample of every port, reduced to at most one event.
    ///
    /// Press edges win over stick direction: A, then B, then center press,
    /// then the strongest deflected axis. All edge state updates from this
    /// sample are applied before the winner is picked, so a held button
    /// cannot fire twice.
    pub fn poll(&mut self) -> Option<InputEvent> {
        let (a, b) = self.pad.read();
        let a_edge = a && !self.prev_a;
        let b_edge = b && !self.prev_b;
        self.prev_a = a;
        self.prev_b = b;

        let mut center_edge = false;
        let mut dir = None;
        if let Some(stick) = &self.stick {
            let center = stick.pressed();
            center_edge = center && !self.prev_center;
            self.prev_center = center;
            dir = direction(stick.x(), stick.y(), self.dead_zone);
        }

        if a_edge {
            return Some(InputEvent::ButtonA);
        }
        if b_edge {
            return Some(InputEvent::ButtonB);
        }
        if center_edge {
            return Some(InputEvent::Confirm);
        }
        dir
    }

    /// Like [`poll`](Self::poll), but a directional event identical to the
    /// last accepted one is suppressed until the debounce interval has
    /// passed. A change of direction passes immediately. Button events are
    /// never debounced; their edge detection already makes them discrete.
    pub fn poll_debounced(&mut self, clock: &dyn Clock) -> Option<InputEvent> {
        let ev = self.poll()?;
        if !ev.is_directional() {
            return Some(ev);
        }
        let now = clock.now_ms();
        if self.last_dir == Some(ev) && elapsed(now, self.last_dir_at) < self.debounce_ms {
            return None;
        }
        self.last_dir = Some(ev);
        self.last_dir_at = now;
        Some(ev)
    }

    /// Block until a press edge on A, B, or the stick center.
    pub fn wait_any_press(&mut self, clock: &dyn Clock) -> Press {
        loop {
            match self.poll() {
                Some(InputEvent::ButtonA) => return Press::A,
                Some(InputEvent::ButtonB) => return Press::B,
                Some(InputEvent::Confirm) => return Press::Center,
                _ => {}
            }
            clock.sleep_ms(self.press_poll_ms);
        }
    }
}

/// Dead-zone filtered direction of a stick sample. Readings exactly at the
/// threshold are still centered; ties between axes go to the X axis.
fn direction(x: f32, y: f32, dead_zone: f32) -> Option<InputEvent> {
    if x.abs() <= dead_zone && y.abs() <= dead_zone {
        return None;
    }
    Some(if x.abs() >= y.abs() {
        if x > 0.0 {
            InputEvent::Right
        } else {
            InputEvent::Left
        }
    } else if y > 0.0 {
        InputEvent::Up
    } else {
        InputEvent::Down
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockClock, MockJoystick, MockPad};
    use std::rc::Rc;

    fn source_with_stick(stick: Rc<MockJoystick>) -> InputSource {
        InputSource::new(Box::new(MockPad::idle()), Some(Box::new(stick)), &Tuning::default())
    }

    #[test]
    fn test_dead_zone_boundary_is_inclusive() {
        let stick = Rc::new(MockJoystick::default());
        let mut input = source_with_stick(stick.clone());

        stick.set(0.35, 0.0);
        assert_eq!(input.poll(), None, "reading exactly at the threshold is centered");
        stick.set(-0.35, 0.35);
        assert_eq!(input.poll(), None);

        stick.set(0.36, 0.0);
        assert_eq!(input.poll(), Some(InputEvent::Right));
        stick.set(-0.36, 0.0);
        assert_eq!(input.poll(), Some(InputEvent::Left));
        stick.set(0.0, 0.8);
        assert_eq!(input.poll(), Some(InputEvent::Up));
        stick.set(0.0, -0.8);
        assert_eq!(input.poll(), Some(InputEvent::Down));
    }

    #[test]
    fn test_strongest_axis_wins() {
        let stick = Rc::new(MockJoystick::default());
        let mut input = source_with_stick(stick.clone());

        stick.set(0.9, 0.5);
        assert_eq!(input.poll(), Some(InputEvent::Right));
        stick.set(0.5, -0.9);
        assert_eq!(input.poll(), Some(InputEvent::Down));
    }

    #[test]
    fn test_button_fires_on_edge_only() {
        let pad = MockPad::script(vec![(true, false), (true, false), (false, false), (true, false)]);
        let mut input = InputSource::new(Box::new(pad), None, &Tuning::default());

        assert_eq!(input.poll(), Some(InputEvent::ButtonA));
        assert_eq!(input.poll(), None, "held button must not repeat");
        assert_eq!(input.poll(), None);
        assert_eq!(input.poll(), Some(InputEvent::ButtonA), "re-press fires again");
    }

    #[test]
    fn test_button_edge_beats_direction() {
        let stick = Rc::new(MockJoystick::default());
        stick.set(1.0, 0.0);
        let pad = MockPad::script(vec![(false, true)]);
        let mut input =
            InputSource::new(Box::new(pad), Some(Box::new(stick)), &Tuning::default());

        assert_eq!(input.poll(), Some(InputEvent::ButtonB));
        assert_eq!(input.poll(), Some(InputEvent::Right), "direction surfaces once the edge is consumed");
    }

    #[test]
    fn test_held_direction_is_debounced() {
        let clock = MockClock::new();
        let stick = Rc::new(MockJoystick::default());
        let mut input = source_with_stick(stick.clone());

        stick.set(1.0, 0.0);
        assert_eq!(input.poll_debounced(&clock), Some(InputEvent::Right));
        clock.advance(100);
        assert_eq!(input.poll_debounced(&clock), None, "same direction inside the window");
        clock.advance(250);
        assert_eq!(input.poll_debounced(&clock), Some(InputEvent::Right), "window elapsed, repeat accepted");
    }

    #[test]
    fn test_direction_change_passes_immediately() {
        let clock = MockClock::new();
        let stick = Rc::new(MockJoystick::default());
        let mut input = source_with_stick(stick.clone());

        stick.set(1.0, 0.0);
        assert_eq!(input.poll_debounced(&clock), Some(InputEvent::Right));
        clock.advance(50);
        stick.set(0.0, 1.0);
        assert_eq!(input.poll_debounced(&clock), Some(InputEvent::Up));
    }

    #[test]
    fn test_button_only_fallback() {
        let pad = MockPad::script(vec![(false, false), (true, false)]);
        let mut input = InputSource::new(Box::new(pad), None, &Tuning::default());

        assert!(!input.has_joystick());
        assert_eq!(input.poll(), None);
        assert_eq!(input.poll(), Some(InputEvent::ButtonA));
    }

    #[test]
    fn test_wait_any_press_reports_source() {
        let clock = MockClock::new();
        let pad = MockPad::script(vec![(false, false), (false, false), (false, true)]);
        let mut input = InputSource::new(Box::new(pad), None, &Tuning::default());

        assert_eq!(input.wait_any_press(&clock), Press::B);
        assert!(clock.now_ms() >= 20, "idle polls sleep between reads");
    }
}
