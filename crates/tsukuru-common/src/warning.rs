//! Recoverable conditions collected during a load.
//!
//! A corrupt archive slot, an undecodable record or an unbalanced event block
//! never aborts a project load. Each one is recorded as a [`Warning`] and handed
//! back next to whatever did load, wrapped in [`Loaded`].

use std::fmt;

/// Category of a recoverable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum WarningKind {
    /// Input was not the expected format (bad magic or header).
    Format,
    /// A declared size ran past the available bytes.
    Truncated,
    /// The resource key was missing or malformed.
    Key,
    /// A record decoded but broke an invariant (duplicate id, wrong type).
    Schema,
    /// Event command blocks did not nest consistently.
    Structure,
    /// Filesystem access failed for a single file.
    Io,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Truncated => "truncated",
            Self::Key => "key",
            Self::Schema => "schema",
            Self::Structure => "structure",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Warning {
    pub kind: WarningKind,
    /// Where it happened, e.g. `Map003.json` or `Game.rgss3a`.
    pub context: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.context, self.message)
    }
}

/// An append-only list of warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it as a `tracing` event.
    pub fn push(&mut self, kind: WarningKind, context: impl Into<String>, message: impl Into<String>) {
        let warning = Warning {
            kind,
            context: context.into(),
            message: message.into(),
        };
        tracing::warn!(kind = %warning.kind, context = %warning.context, "{}", warning.message);
        self.0.push(warning);
    }

    /// Move all warnings from `other` into this list, keeping order.
    pub fn extend(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.0.iter()
    }

    /// Number of warnings of one kind.
    pub fn count(&self, kind: WarningKind) -> usize {
        self.0.iter().filter(|w| w.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Warning> for Warnings {
    fn from_iter<I: IntoIterator<Item = Warning>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A successfully produced value together with the warnings raised on the way.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    pub warnings: Warnings,
}

impl<T> Loaded<T> {
    pub fn new(value: T, warnings: Warnings) -> Self {
        Self { value, warnings }
    }

    /// A value produced without any warnings.
    pub fn clean(value: T) -> Self {
        Self::new(value, Warnings::new())
    }

    /// Transform the value, keeping the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// Split into the value, appending the warnings to `sink`.
    pub fn drain_into(self, sink: &mut Warnings) -> T {
        sink.extend(self.warnings);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_count() {
        let mut warnings = Warnings::new();
        warnings.push(WarningKind::Schema, "Items.json", "duplicate id 3");
        warnings.push(WarningKind::Truncated, "Game.rgss3a", "entry past end of file");
        warnings.push(WarningKind::Schema, "Items.json", "record 9 is not an object");

        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings.count(WarningKind::Schema), 2);
        assert_eq!(
            warnings.iter().next().unwrap().to_string(),
            "[schema] Items.json: duplicate id 3"
        );
    }

    #[test]
    fn test_loaded_drain_keeps_order() {
        let mut first = Warnings::new();
        first.push(WarningKind::Io, "a", "one");
        let mut second = Warnings::new();
        second.push(WarningKind::Io, "b", "two");

        let mut sink = Warnings::new();
        let value = Loaded::new(5, first).map(|v| v * 2).drain_into(&mut sink);
        sink.extend(second);

        assert_eq!(value, 10);
        let contexts: Vec<_> = sink.iter().map(|w| w.context.as_str()).collect();
        assert_eq!(contexts, ["a", "b"]);
    }
}
