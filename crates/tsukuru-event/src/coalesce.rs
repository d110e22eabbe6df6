//! Merging of multi-command instructions.
//!
//! Text, comments, scripts, shop goods and move routes are stored as a head
//! command followed by continuation commands. [`Coalescer`] walks a command
//! list and yields each head together with the continuations that belong to
//! it. Accumulation stops at the first command that is not the head's
//! continuation opcode, or at the end of the list.

use tsukuru_data::model::Command;

use crate::opcode::continuation_of;

/// One logical instruction: a head command and its continuations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Group<'a> {
    commands: &'a [Command],
}

impl<'a> Group<'a> {
    #[inline]
    pub fn head(&self) -> &'a Command {
        &self.commands[0]
    }

    #[inline]
    pub fn continuations(&self) -> &'a [Command] {
        &self.commands[1..]
    }

    /// Raw commands covered, head included.
    #[inline]
    pub fn span(&self) -> usize {
        self.commands.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Collecting `continuation` commands after the head at `start`.
    Accumulating { start: usize, continuation: i32 },
    /// The group starting at `start` ends before the current position.
    Flush { start: usize },
}

/// Iterator over the [`Group`]s of a command list.
#[derive(Debug, Clone)]
pub struct Coalescer<'a> {
    commands: &'a [Command],
    position: usize,
    state: State,
}

impl<'a> Coalescer<'a> {
    pub fn new(commands: &'a [Command]) -> Self {
        Self {
            commands,
            position: 0,
            state: State::Idle,
        }
    }

    fn group(&self, start: usize) -> Group<'a> {
        Group {
            commands: &self.commands[start..self.position],
        }
    }
}

impl<'a> Iterator for Coalescer<'a> {
    type Item = Group<'a>;

    fn next(&mut self) -> Option<Group<'a>> {
        loop {
            let commands = self.commands;
            let current = commands.get(self.position);
            match (self.state, current) {
                (State::Idle, None) => return None,
                (State::Idle, Some(command)) => {
                    let start = self.position;
                    self.position += 1;
                    match continuation_of(command.code) {
                        Some(continuation) => self.state = State::Accumulating { start, continuation },
                        None => return Some(self.group(start)),
                    }
                }
                (State::Accumulating { continuation, .. }, Some(command)) if command.code == continuation => {
                    self.position += 1;
                }
                (State::Accumulating { start, .. }, _) => self.state = State::Flush { start },
                (State::Flush { start }, _) => {
                    self.state = State::Idle;
                    return Some(self.group(start));
                }
            }
        }
    }
}

/// Group a command list.
pub fn coalesce(commands: &[Command]) -> Coalescer<'_> {
    Coalescer::new(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn commands(codes: &[i32]) -> Vec<Command> {
        codes.iter().map(|&code| Command::new(code, 0, vec![json!("x")])).collect()
    }

    fn shape(codes: &[i32]) -> Vec<(i32, usize)> {
        let list = commands(codes);
        coalesce(&list).map(|group| (group.head().code, group.span())).collect()
    }

    #[test]
    fn test_text_then_move_route() {
        assert_eq!(shape(&[101, 401, 401, 205]), vec![(101, 3), (205, 1)]);
    }

    #[test]
    fn test_stops_at_other_opcode() {
        assert_eq!(
            shape(&[101, 401, 408, 401, 108, 408, 408]),
            vec![(101, 2), (408, 1), (401, 1), (108, 3)]
        );
    }

    #[test]
    fn test_continuation_of_another_head_is_not_merged() {
        // A script line cannot extend a text box.
        assert_eq!(shape(&[101, 655, 355, 655, 0]), vec![(101, 1), (655, 1), (355, 2), (0, 1)]);
    }

    #[test]
    fn test_every_command_covered_once() {
        let codes = [302, 605, 605, 205, 505, 505, 0, 105, 405];
        let list = commands(&codes);
        let covered: usize = coalesce(&list).map(|group| group.span()).sum();
        assert_eq!(covered, codes.len());
        assert_eq!(shape(&codes), vec![(302, 3), (205, 3), (0, 1), (105, 2)]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(coalesce(&[]).count(), 0);
    }
}
