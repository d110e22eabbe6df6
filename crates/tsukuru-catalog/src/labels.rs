//! Display names for the numeric codes used across the database.

pub const PARAMS: [&str; 8] = ["Max HP", "Max MP", "Attack", "Defense", "M.Attack", "M.Defense", "Agility", "Luck"];

pub const XPARAMS: [&str; 10] = [
    "Hit Rate",
    "Evasion Rate",
    "Critical Rate",
    "Critical Evasion",
    "Magic Evasion",
    "Magic Reflection",
    "Counter Attack",
    "HP Regeneration",
    "MP Regeneration",
    "TP Regeneration",
];

pub const SPARAMS: [&str; 10] = [
    "Target Rate",
    "Guard Effect",
    "Recovery Effect",
    "Pharmacology",
    "MP Cost Rate",
    "TP Charge Rate",
    "Physical Damage",
    "Magical Damage",
    "Floor Damage",
    "Experience",
];

fn pick(table: &[&'static str], index: i32) -> Option<&'static str> {
    usize::try_from(index).ok().and_then(|i| table.get(i)).copied()
}

pub fn param(index: i32) -> &'static str {
    pick(&PARAMS, index).unwrap_or("?")
}

pub fn xparam(index: i32) -> String {
    pick(&XPARAMS, index).map_or_else(|| format!("Ex-parameter {index}"), str::to_owned)
}

pub fn sparam(index: i32) -> String {
    pick(&SPARAMS, index).map_or_else(|| format!("Sp-parameter {index}"), str::to_owned)
}

pub fn scope(code: i32) -> &'static str {
    match code {
        0 => "None",
        1 => "1 Enemy",
        2 => "All Enemies",
        3 => "1 Random Enemy",
        4 => "2 Random Enemies",
        5 => "3 Random Enemies",
        6 => "4 Random Enemies",
        7 => "1 Ally",
        8 => "All Allies",
        9 => "1 Ally (Dead)",
        10 => "All Allies (Dead)",
        11 => "The User",
        _ => "?",
    }
}

pub fn occasion(code: i32) -> &'static str {
    match code {
        0 => "Always",
        1 => "Battle Screen",
        2 => "Menu Screen",
        3 => "Never",
        _ => "?",
    }
}

pub fn hit_type(code: i32) -> &'static str {
    match code {
        0 => "Certain Hit",
        1 => "Physical Attack",
        2 => "Magical Attack",
        _ => "?",
    }
}

pub fn damage_type(code: i32) -> String {
    match code {
        0 => "None".to_owned(),
        1 => "HP Damage".to_owned(),
        2 => "MP Damage".to_owned(),
        3 => "HP Recover".to_owned(),
        4 => "MP Recover".to_owned(),
        5 => "HP Drain".to_owned(),
        6 => "MP Drain".to_owned(),
        other => format!("Type #{other}"),
    }
}

pub fn item_type(code: i32) -> &'static str {
    match code {
        1 => "Regular Item",
        2 => "Key Item",
        3 => "Hidden Item A",
        4 => "Hidden Item B",
        _ => "Item",
    }
}

/// Name from a 1-based system term list, `#id` when absent or blank.
pub fn term(list: &[String], id: i32) -> String {
    usize::try_from(id)
        .ok()
        .and_then(|i| list.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map_or_else(|| format!("#{id}"), str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_codes() {
        assert_eq!(param(9), "?");
        assert_eq!(param(-1), "?");
        assert_eq!(xparam(12), "Ex-parameter 12");
        assert_eq!(damage_type(9), "Type #9");
        assert_eq!(term(&["".into(), "Sword".into()], 1), "Sword");
        assert_eq!(term(&["".into(), " ".into()], 1), "#1");
    }
}
