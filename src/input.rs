use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

use crate::sort::{Comparator, Direction};

/// Everything a key can ask the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Reload,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageUp,
    PageDown,
    PageLeft,
    PageRight,
    GotoTop,
    GotoBottom,
    LineHome,
    LineEnd,
    GotoColumn,
    Mark,
    ReturnToMark,
    ShowCell,
    StartSearch,
    NextMatch,
    PrevMatch,
    ToggleHeader,
    Sort(Comparator, Direction),
    Yank,
    Help,
    ToggleWidthMode,
    WidenAll,
    NarrowAll,
    WidenColumn,
    NarrowColumn,
    MaximizeColumn,
    ResetColumn,
    WidenGap,
    NarrowGap,
    SkipRowChange { forward: bool },
    SkipColumnChange { forward: bool },
    CancelCount,
}

/// A command together with the count typed before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub count: Option<usize>,
}

impl Invocation {
    /// Repeat count, defaulting to 1.
    pub fn repeat(&self) -> usize {
        self.count.unwrap_or(1)
    }

    /// Repeat count as a signed step for width adjustments.
    pub fn step(&self) -> isize {
        isize::try_from(self.repeat()).unwrap_or(isize::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpreterState {
    #[default]
    Idle,
    AccumulatingCount(usize),
}

/// Turns key presses into [`Invocation`]s, collecting numeric prefixes.
#[derive(Debug, Default)]
pub struct Interpreter {
    state: InterpreterState,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InterpreterState {
        self.state
    }

    pub fn pending_count(&self) -> Option<usize> {
        match self.state {
            InterpreterState::Idle => None,
            InterpreterState::AccumulatingCount(n) => Some(n),
        }
    }

    /// Feed one key. Returns a command once a non-digit key completes it.
    pub fn feed(&mut self, key: KeyEvent) -> Option<Invocation> {
        if let Some(digit) = plain_digit(&key) {
            match self.state {
                InterpreterState::Idle if digit == 0 => {
                    return Some(Invocation {
                        command: Command::LineHome,
                        count: None,
                    });
                }
                InterpreterState::Idle => {
                    self.state = InterpreterState::AccumulatingCount(digit);
                }
                InterpreterState::AccumulatingCount(n) => {
                    self.state = InterpreterState::AccumulatingCount(
                        n.saturating_mul(10).saturating_add(digit),
                    );
                }
            }
            return None;
        }

        let command = command_for(&key)?;
        let count = self.pending_count();
        self.state = InterpreterState::Idle;
        trace!(?command, ?count, "key dispatched");
        if command == Command::CancelCount {
            return None;
        }
        Some(Invocation { command, count })
    }
}

fn plain_digit(key: &KeyEvent) -> Option<usize> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Char(c) => c.to_digit(10).map(|d| d as usize),
        _ => None,
    }
}

/// Default keymap. Digits are handled by the interpreter before this runs.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    use Command::*;

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('f') => Some(PageDown),
            KeyCode::Char('b') => Some(PageUp),
            KeyCode::Char('c') => Some(Quit),
            _ => None,
        };
    }

    let command = match key.code {
        KeyCode::Char(c) => match c {
            'q' | 'Q' => Quit,
            'r' => Reload,
            'j' => MoveDown,
            'k' => MoveUp,
            'h' => MoveLeft,
            'l' => MoveRight,
            'J' => PageDown,
            'K' => PageUp,
            'H' => PageLeft,
            'L' => PageRight,
            'g' => GotoTop,
            'G' => GotoBottom,
            '^' => LineHome,
            '$' => LineEnd,
            '|' => GotoColumn,
            'm' => Mark,
            '\'' => ReturnToMark,
            '/' => StartSearch,
            'n' => NextMatch,
            'p' => PrevMatch,
            't' => ToggleHeader,
            's' => Sort(Comparator::Lexicographic, Direction::Ascending),
            'S' => Sort(Comparator::Lexicographic, Direction::Descending),
            'a' => Sort(Comparator::Natural, Direction::Ascending),
            'A' => Sort(Comparator::Natural, Direction::Descending),
            '#' => Sort(Comparator::Numeric, Direction::Ascending),
            '@' => Sort(Comparator::Numeric, Direction::Descending),
            'y' => Yank,
            '?' => Help,
            'w' => ToggleWidthMode,
            '>' => WidenAll,
            '<' => NarrowAll,
            '.' => WidenColumn,
            ',' => NarrowColumn,
            'C' => MaximizeColumn,
            'c' => ResetColumn,
            '+' | '=' => WidenGap,
            '-' | '_' => NarrowGap,
            ']' => SkipRowChange { forward: true },
            '[' => SkipRowChange { forward: false },
            '}' => SkipColumnChange { forward: true },
            '{' => SkipColumnChange { forward: false },
            '\n' | '\r' => ShowCell,
            _ => return None,
        },
        KeyCode::Up => MoveUp,
        KeyCode::Down => MoveDown,
        KeyCode::Left => MoveLeft,
        KeyCode::Right => MoveRight,
        KeyCode::PageUp => PageUp,
        KeyCode::PageDown => PageDown,
        KeyCode::Home => GotoTop,
        KeyCode::End => GotoBottom,
        KeyCode::Insert => Mark,
        KeyCode::Delete => ReturnToMark,
        KeyCode::Enter => ShowCell,
        KeyCode::F(1) => Help,
        KeyCode::Esc => CancelCount,
        _ => return None,
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn feed_all(it: &mut Interpreter, keys: &str) -> Vec<Invocation> {
        keys.chars().filter_map(|c| it.feed(key(c))).collect()
    }

    #[test]
    fn plain_key_has_no_count() {
        let mut it = Interpreter::new();
        let got = feed_all(&mut it, "j");
        assert_eq!(
            got,
            vec![Invocation {
                command: Command::MoveDown,
                count: None
            }]
        );
        assert_eq!(got[0].repeat(), 1);
    }

    #[test]
    fn digits_accumulate_into_count() {
        let mut it = Interpreter::new();
        assert!(it.feed(key('1')).is_none());
        assert_eq!(it.state(), InterpreterState::AccumulatingCount(1));
        assert!(it.feed(key('2')).is_none());
        assert!(it.feed(key('0')).is_none());
        assert_eq!(it.pending_count(), Some(120));
        let inv = it.feed(key('G'));
        assert_eq!(
            inv,
            Some(Invocation {
                command: Command::GotoBottom,
                count: Some(120)
            })
        );
        assert_eq!(it.state(), InterpreterState::Idle);
    }

    #[test]
    fn leading_zero_is_line_home() {
        let mut it = Interpreter::new();
        let got = feed_all(&mut it, "0");
        assert_eq!(got[0].command, Command::LineHome);
        assert_eq!(it.state(), InterpreterState::Idle);
    }

    #[test]
    fn unknown_keys_leave_count_alone() {
        let mut it = Interpreter::new();
        it.feed(key('5'));
        assert!(it.feed(key('z')).is_none());
        assert!(it.feed(KeyEvent::new(KeyCode::F(9), KeyModifiers::NONE)).is_none());
        assert_eq!(it.pending_count(), Some(5));
        let inv = it.feed(key('j'));
        assert_eq!(inv.map(|i| i.repeat()), Some(5));
    }

    #[test]
    fn escape_discards_count() {
        let mut it = Interpreter::new();
        it.feed(key('4'));
        assert!(it.feed(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)).is_none());
        assert_eq!(it.state(), InterpreterState::Idle);
        assert_eq!(feed_all(&mut it, "k")[0].count, None);
    }

    #[test]
    fn huge_counts_saturate() {
        let mut it = Interpreter::new();
        let got = feed_all(&mut it, "99999999999999999999999999l");
        assert_eq!(got[0].count, Some(usize::MAX));
        assert_eq!(got[0].step(), isize::MAX);
    }

    #[test]
    fn control_keys() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(command_for(&ctrl('f')), Some(Command::PageDown));
        assert_eq!(command_for(&ctrl('b')), Some(Command::PageUp));
        assert_eq!(command_for(&ctrl('x')), None);

        let mut it = Interpreter::new();
        it.feed(key('3'));
        assert_eq!(it.feed(ctrl('f')).map(|i| i.repeat()), Some(3));
    }

    #[test]
    fn shifted_letters_map_to_their_commands() {
        let shifted = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);
        assert_eq!(
            command_for(&shifted),
            Some(Command::Sort(Comparator::Lexicographic, Direction::Descending))
        );
    }
}
