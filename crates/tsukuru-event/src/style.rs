use std::fmt;

use serde::Serialize;

/// Presentation class of a rendered instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    Dialogue,
    Choice,
    ScrollText,
    Comment,
    Conditional,
    Loop,
    CommonEventCall,
    Switch,
    Variable,
    Item,
    Transfer,
    Battle,
    Shop,
    Audio,
    Screen,
    Picture,
    Movement,
    Script,
    System,
    Actor,
    Label,
    Wait,
    Unknown,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dialogue => "dialogue",
            Self::Choice => "choice",
            Self::ScrollText => "scroll-text",
            Self::Comment => "comment",
            Self::Conditional => "conditional",
            Self::Loop => "loop",
            Self::CommonEventCall => "common-event-call",
            Self::Switch => "switch",
            Self::Variable => "variable",
            Self::Item => "item",
            Self::Transfer => "transfer",
            Self::Battle => "battle",
            Self::Shop => "shop",
            Self::Audio => "audio",
            Self::Screen => "screen",
            Self::Picture => "picture",
            Self::Movement => "movement",
            Self::Script => "script",
            Self::System => "system",
            Self::Actor => "actor",
            Self::Label => "label",
            Self::Wait => "wait",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_name_matches_display() {
        for style in [Style::CommonEventCall, Style::ScrollText, Style::Dialogue] {
            let json = serde_json::to_value(style).unwrap();
            assert_eq!(json.as_str(), Some(style.as_str()));
        }
    }
}
