//! Block nesting checks.
//!
//! Rendering keeps each command's stored indent. This pass only reports
//! lists whose openers and closers do not pair up, so a damaged page still
//! renders in full.

use tsukuru_common::{WarningKind, Warnings};
use tsukuru_data::model::Command;

use crate::opcode::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Open {
    opener: i32,
    closer: i32,
    indent: i32,
    position: usize,
}

/// Closer expected for a block opener at `position`, if it opens one.
fn closer_for(commands: &[Command], position: usize) -> Option<i32> {
    let command = &commands[position];
    match command.code {
        CONDITIONAL => Some(CONDITIONAL_END),
        LOOP => Some(REPEAT_ABOVE),
        SHOW_CHOICES => Some(CHOICES_END),
        // Battles only open a block when they carry result branches.
        BATTLE => commands[position + 1..]
            .iter()
            .find(|next| next.indent <= command.indent)
            .filter(|next| next.indent == command.indent && matches!(next.code, IF_WIN | IF_ESCAPE | IF_LOSE))
            .map(|_| BATTLE_END),
        _ => None,
    }
}

fn is_closer(code: i32) -> bool {
    matches!(code, CONDITIONAL_END | REPEAT_ABOVE | CHOICES_END | BATTLE_END)
}

/// Check opener/closer pairing and indent steps, recording problems under `context`.
pub fn check_balance(commands: &[Command], context: &str, warnings: &mut Warnings) {
    let mut stack: Vec<Open> = Vec::new();
    let mut previous_indent = 0;

    for (position, command) in commands.iter().enumerate() {
        if command.indent > previous_indent + 1 {
            warnings.push(
                WarningKind::Structure,
                context,
                format!(
                    "command {} at {position} jumps from indent {previous_indent} to {}",
                    command.code, command.indent
                ),
            );
        }
        previous_indent = command.indent;

        if is_closer(command.code) {
            match stack.last() {
                Some(open) if open.closer == command.code => {
                    if open.indent != command.indent {
                        warnings.push(
                            WarningKind::Structure,
                            context,
                            format!(
                                "closer {} at {position} has indent {}, opener {} at {} has {}",
                                command.code, command.indent, open.opener, open.position, open.indent
                            ),
                        );
                    }
                    stack.pop();
                }
                Some(open) => warnings.push(
                    WarningKind::Structure,
                    context,
                    format!(
                        "closer {} at {position} does not match opener {} at {}",
                        command.code, open.opener, open.position
                    ),
                ),
                None => warnings.push(
                    WarningKind::Structure,
                    context,
                    format!("closer {} at {position} has no opener", command.code),
                ),
            }
        }

        if let Some(closer) = closer_for(commands, position) {
            stack.push(Open {
                opener: command.code,
                closer,
                indent: command.indent,
                position,
            });
        }
    }

    for open in stack {
        warnings.push(
            WarningKind::Structure,
            context,
            format!("opener {} at {} is never closed", open.opener, open.position),
        );
    }
}
