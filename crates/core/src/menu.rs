//! Paginated, wrap-around menu rendered on the text screen.
//!
//! Selection and page are one piece of state: every move recomputes the
//! page from the selected index, so the visible window can never drift
//! from the cursor. Navigation accepts both the stick and the buttons
//! (A steps forward, B confirms), keeping every menu usable on a board
//! without a joystick.

use crate::config::Tuning;
use crate::input::InputEvent;
use crate::peripherals::{Peripherals, TextScreen};
use crate::SCREEN_COLS;

/// Cursor plus derived page over a fixed option list.
#[derive(Debug, Clone)]
pub struct MenuState {
    selected: usize,
    page: usize,
    num_options: usize,
    page_size: usize,
}

impl MenuState {
    pub fn new(num_options: usize, page_size: usize) -> Self {
        MenuState {
            selected: 0,
            page: 0,
            num_options,
            page_size: page_size.max(1),
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Step the cursor forward, wrapping past the last option to the
    /// first.
    pub fn next(&mut self) {
        if self.num_options == 0 {
            return;
        }
        self.selected = (self.selected + 1) % self.num_options;
        self.page = self.selected / self.page_size;
    }

    /// Step the cursor back, wrapping past the first option to the last.
    pub fn prev(&mut self) {
        if self.num_options == 0 {
            return;
        }
        self.selected = (self.selected + self.num_options - 1) % self.num_options;
        self.page = self.selected / self.page_size;
    }
}

/// Current page as display lines: header (with a position indicator once
/// the list spills over one page), a rule, then the visible options with
/// a cursor marker.
pub fn render_lines(title: &str, options: &[&str], state: &MenuState) -> Vec<String> {
    let mut lines = Vec::with_capacity(2 + state.page_size);
    if options.len() > state.page_size {
        lines.push(format!("{} [{}/{}]", title, state.selected + 1, state.num_options));
    } else {
        lines.push(title.to_string());
    }
    lines.push("-".repeat(SCREEN_COLS));
    let start = state.page * state.page_size;
    for (i, opt) in options.iter().enumerate().skip(start).take(state.page_size) {
        let marker = if i == state.selected { '>' } else { ' ' };
        lines.push(format!("{} {}", marker, opt));
    }
    lines
}

fn draw(screen: &mut dyn TextScreen, title: &str, options: &[&str], state: &MenuState) {
    let lines = render_lines(title, options, state);
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    screen.show_lines(&refs);
}

/// Run the menu until a choice is confirmed; returns the selected index.
///
/// Down or button A moves forward, Up moves back, center press or button B
/// confirms. The screen is redrawn after every accepted move.
pub fn navigate(title: &str, options: &[&str], p: &mut Peripherals, tuning: &Tuning) -> usize {
    let mut state = MenuState::new(options.len(), tuning.menu_page_size);
    draw(p.screen.as_mut(), title, options, &state);
    loop {
        match p.input.poll_debounced(p.clock.as_ref()) {
            Some(InputEvent::Down) | Some(InputEvent::ButtonA) => {
                state.next();
                draw(p.screen.as_mut(), title, options, &state);
            }
            Some(InputEvent::Up) => {
                state.prev();
                draw(p.screen.as_mut(), title, options, &state);
            }
            Some(InputEvent::Confirm) | Some(InputEvent::ButtonB) => return state.selected(),
            _ => {}
        }
        p.clock.sleep_ms(tuning.press_poll_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockPad, Rig};

    #[test]
    fn test_wraparound_is_closed() {
        let mut state = MenuState::new(5, 3);
        for _ in 0..5 {
            state.next();
        }
        assert_eq!(state.selected(), 0);
        assert_eq!(state.page(), 0);

        state.prev();
        assert_eq!(state.selected(), 4, "back from first wraps to last");
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_page_follows_cursor() {
        // seven options, three per page: six steps land on the last page
        let mut state = MenuState::new(7, 3);
        for _ in 0..6 {
            state.next();
        }
        assert_eq!(state.selected(), 6);
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn test_render_marks_selection_and_page() {
        let options = ["Reaction", "Memory", "Tilt", "Maze"];
        let mut state = MenuState::new(options.len(), 3);
        state.next();
        let lines = render_lines("Games", &options, &state);
        assert_eq!(lines[0], "Games [2/4]");
        assert_eq!(lines[2], "  Reaction");
        assert_eq!(lines[3], "> Memory");

        // cursor onto the second page narrows the window
        state.next();
        state.next();
        let lines = render_lines("Games", &options, &state);
        assert_eq!(lines[0], "Games [4/4]");
        assert_eq!(lines[2], "> Maze");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_render_short_list_has_no_page_indicator() {
        let state = MenuState::new(2, 3);
        let lines = render_lines("Games", &["Reaction", "Memory"], &state);
        assert_eq!(lines[0], "Games");
    }

    #[test]
    fn test_navigate_steps_and_confirms() {
        // one A tap (step to index 1), then one B tap (confirm)
        let pad = MockPad::script(vec![
            (false, false),
            (true, false),
            (false, false),
            (false, true),
        ]);
        let tuning = Tuning::default();
        let (mut p, rig) = Rig::build(pad, false, false, &tuning);

        let choice = navigate("Games", &["Reaction", "Memory", "Tilt"], &mut p, &tuning);
        assert_eq!(choice, 1);
        // initial draw plus one redraw after the accepted step
        assert_eq!(rig.screen.screens().len(), 2);
        assert!(rig.screen.saw("> Memory"));
    }
}
