//! Note table and the canned jingles shared by the stages.

use crate::clock::Clock;
use crate::peripherals::Speaker;

/// One octave of named notes, C4 through C5.
pub const NOTES: [(&str, u32); 8] = [
    ("C4", 262),
    ("D4", 294),
    ("E4", 330),
    ("F4", 349),
    ("G4", 392),
    ("A4", 440),
    ("B4", 494),
    ("C5", 523),
];

pub fn note_freq(name: &str) -> Option<u32> {
    NOTES.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

/// Play a named note; unknown names log and stay silent.
pub fn play_note(speaker: &mut dyn Speaker, name: &str, ms: u64) {
    match note_freq(name) {
        Some(freq) => speaker.play(freq, ms),
        None => tracing::warn!("unknown note {name:?}"),
    }
}

/// Quick rising sweep used as the session opener.
pub fn play_start(speaker: &mut dyn Speaker) {
    for freq in (200..600).step_by(20) {
        speaker.play(freq, 10);
    }
}

/// Three-note victory jingle.
pub fn play_finish(speaker: &mut dyn Speaker, clock: &dyn Clock) {
    speaker.play(440, 150);
    clock.sleep_ms(50);
    speaker.play(554, 150);
    clock.sleep_ms(50);
    speaker.play(659, 300);
}

/// Descending game-over figure.
pub fn play_game_over(speaker: &mut dyn Speaker, clock: &dyn Clock) {
    speaker.play(392, 200);
    clock.sleep_ms(50);
    speaker.play(349, 200);
    clock.sleep_ms(50);
    speaker.play(330, 400);
}

/// Short acknowledgement blip.
pub fn beep(speaker: &mut dyn Speaker) {
    speaker.play(880, 50);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockClock, MockSpeaker};

    #[test]
    fn test_note_lookup() {
        assert_eq!(note_freq("A4"), Some(440));
        assert_eq!(note_freq("C5"), Some(523));
        assert_eq!(note_freq("H4"), None);
    }

    #[test]
    fn test_unknown_note_is_silent() {
        let mut speaker = MockSpeaker::default();
        play_note(&mut speaker, "H4", 100);
        assert!(speaker.tones().is_empty());
    }

    #[test]
    fn test_start_sweep_rises() {
        let mut speaker = MockSpeaker::default();
        play_start(&mut speaker);
        let tones = speaker.tones();
        assert_eq!(tones.len(), 20);
        assert!(tones.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_finish_jingle_shape() {
        let clock = MockClock::new();
        let mut speaker = MockSpeaker::default();
        play_finish(&mut speaker, &clock);
        assert_eq!(speaker.tones(), vec![(440, 150), (554, 150), (659, 300)]);
    }
}
