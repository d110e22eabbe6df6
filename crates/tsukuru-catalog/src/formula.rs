//! Plain-language reading of damage formulas.
//!
//! Formulas are JavaScript (MV/MZ) or Ruby (VX Ace) expressions over the
//! user `a`, the target `b` and game variables `v[n]`. Known fragments are
//! rewritten in one left-to-right pass, so text inserted for one fragment
//! (a variable's name, say) is never rewritten again. Anything else is kept
//! verbatim.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tsukuru_data::{NameLookup, RefKind};

#[derive(Debug, Clone, Copy)]
enum Rewrite {
    Fixed(&'static str),
    /// `a.` or `b.` stat access, labelled with the given owner.
    Stat(&'static str),
    Variable,
}

const STATS: &str = "atk|def|mat|mdf|agi|luk|mhp|mmp|hp|mp|tp|level";

/// Alternatives of [`FORMULA`], in priority order. Each pattern has exactly
/// one capture group so that group `i + 1` identifies rule `i`.
static RULES: LazyLock<Vec<(String, Rewrite)>> = LazyLock::new(|| {
    vec![
        (format!(r"\ba\.({STATS})\b"), Rewrite::Stat("user")),
        (format!(r"\bb\.({STATS})\b"), Rewrite::Stat("target")),
        (r"\bv\s*\[\s*(\d+)\s*\]".to_owned(), Rewrite::Variable),
        (r"(Math\.random\(\))".to_owned(), Rewrite::Fixed("a random number in [0, 1)")),
        (r"(Math\.max)\b".to_owned(), Rewrite::Fixed("max")),
        (r"(Math\.min)\b".to_owned(), Rewrite::Fixed("min")),
        (r"(Math\.floor)\b".to_owned(), Rewrite::Fixed("floor")),
        (r"(Math\.round)\b".to_owned(), Rewrite::Fixed("round")),
        (r"(Math\.abs)\b".to_owned(), Rewrite::Fixed("abs")),
        (r"(\s*\*\s*)".to_owned(), Rewrite::Fixed(" × ")),
        (r"(\s*/\s*)".to_owned(), Rewrite::Fixed(" ÷ ")),
    ]
});

static FORMULA: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let alternation = RULES
        .iter()
        .map(|(pattern, _)| format!("(?:{pattern})"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).ok()
});

fn stat_label(stat: &str) -> &str {
    match stat {
        "atk" => "ATK",
        "def" => "DEF",
        "mat" => "MAT",
        "mdf" => "MDF",
        "agi" => "AGI",
        "luk" => "LUK",
        "mhp" => "max HP",
        "mmp" => "max MP",
        "hp" => "HP",
        "mp" => "MP",
        "tp" => "TP",
        "level" => "level",
        other => other,
    }
}

fn rewrite(caps: &Captures<'_>, names: &dyn NameLookup) -> String {
    let Some((rewrite, value)) = RULES
        .iter()
        .enumerate()
        .find_map(|(i, (_, rewrite))| caps.get(i + 1).map(|m| (*rewrite, m.as_str())))
    else {
        return caps[0].to_owned();
    };
    match rewrite {
        Rewrite::Fixed(s) => s.to_owned(),
        Rewrite::Stat(owner) => format!("{owner} {}", stat_label(value)),
        Rewrite::Variable => match value.parse().ok().and_then(|id| names.name_of(RefKind::Variable, id)) {
            Some(name) => format!("variable {value} ({name})"),
            None => format!("variable {value}"),
        },
    }
}

/// Rewrite `formula` in words. Returns an empty string for an empty formula.
pub fn explain_formula(formula: &str, names: &dyn NameLookup) -> String {
    let formula = formula.trim();
    match FORMULA.as_ref() {
        Some(regex) => regex.replace_all(formula, |caps: &Captures<'_>| rewrite(caps, names)).into_owned(),
        None => formula.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsukuru_data::Reference;

    struct Vars;

    impl NameLookup for Vars {
        fn name_of(&self, kind: RefKind, id: i32) -> Option<&str> {
            match (kind, id) {
                (RefKind::Variable, 3) => Some("Bonus"),
                (RefKind::Variable, 4) => Some("HP/MP Bonus*2"),
                (RefKind::Variable, 5) => Some("Math.max a.atk"),
                _ => None,
            }
        }

        fn goods_names(&self) -> Vec<(Reference, &str)> {
            Vec::new()
        }
    }

    #[test]
    fn test_standard_attack() {
        assert_eq!(explain_formula("a.atk * 4 - b.def * 2", &Vars), "user ATK × 4 - target DEF × 2");
    }

    #[test]
    fn test_variables_and_math() {
        assert_eq!(
            explain_formula("Math.max(v[3], v[9]) + a.level", &Vars),
            "max(variable 3 (Bonus), variable 9) + user level"
        );
        assert_eq!(
            explain_formula("100 + Math.random() * 50", &Vars),
            "100 + a random number in [0, 1) × 50"
        );
    }

    #[test]
    fn test_variable_names_kept_verbatim() {
        assert_eq!(explain_formula("v[4]", &Vars), "variable 4 (HP/MP Bonus*2)");
        assert_eq!(
            explain_formula("v[5] * 2 / a.hp", &Vars),
            "variable 5 (Math.max a.atk) × 2 ÷ user HP"
        );
    }

    #[test]
    fn test_unknown_fragments_pass_through() {
        assert_eq!(explain_formula("b.isStateAffected(4) ? 500 : 0", &Vars), "b.isStateAffected(4) ? 500 : 0");
        assert_eq!(explain_formula("  ", &Vars), "");
    }
}
