//! Interpreter output.

use serde::Serialize;
use tsukuru_data::Reference;

use crate::style::Style;

/// A reference found in an instruction, with the name it resolved to.
///
/// Ids that point at nothing keep `name: None` instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mention {
    #[serde(flatten)]
    pub reference: Reference,
    pub name: Option<String>,
    /// Battle reached from a story page rather than a random encounter table.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub special: bool,
}

impl Mention {
    pub fn new(reference: Reference, name: Option<&str>) -> Self {
        Self {
            reference,
            name: name.map(str::to_owned),
            special: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.name.is_some()
    }
}

/// One rendered logical instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub code: i32,
    /// Indent of the head command as stored.
    pub indent: i32,
    pub text: String,
    /// Continuation lines merged into this instruction.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
    pub style: Style,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Mention>,
    /// Raw commands covered, head included.
    pub span: usize,
}

impl Instruction {
    pub fn references(&self) -> impl Iterator<Item = Reference> + '_ {
        self.mentions.iter().map(|m| m.reference)
    }
}
