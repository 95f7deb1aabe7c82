use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Fixed slot hierarchy (spec §4.3): which specific positions satisfy each
/// roster slot label.
pub static SLOT_HIERARCHY: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("PG", &["PG"]);
        m.insert("SG", &["SG"]);
        m.insert("SF", &["SF"]);
        m.insert("PF", &["PF"]);
        m.insert("C", &["C"]);
        m.insert("G", &["PG", "SG"]);
        m.insert("F", &["SF", "PF"]);
        m.insert("GF", &["PG", "SG", "SF", "PF"]);
        m.insert("FC", &["SF", "PF", "C"]);
        m.insert("UTIL", &["PG", "SG", "SF", "PF", "C"]);
        m.insert("BE", &["PG", "SG", "SF", "PF", "C"]);
        m.insert("IR", &["IR"]);
        m
    });

/// Starting slots in priority order: specific labels before flex labels.
/// `BE` and `IR` are never starting slots.
pub const STARTING_SLOT_ORDER: &[&str] =
    &["PG", "SG", "SF", "PF", "C", "G", "F", "GF", "FC", "UTIL"];

pub fn can_fill_slot(eligible: &[String], slot: &str) -> bool {
    match SLOT_HIERARCHY.get(slot) {
        Some(positions) => eligible.iter().any(|p| positions.contains(&p.as_str())),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_eligible_fills_g_slot() {
        let eligible = vec!["PG".to_string()];
        assert!(can_fill_slot(&eligible, "G"));
        assert!(!can_fill_slot(&eligible, "F"));
    }

    #[test]
    fn center_cannot_fill_guard_slot() {
        let eligible = vec!["C".to_string()];
        assert!(!can_fill_slot(&eligible, "G"));
        assert!(can_fill_slot(&eligible, "UTIL"));
        assert!(can_fill_slot(&eligible, "FC"));
    }

    #[test]
    fn unknown_slot_never_fillable() {
        let eligible = vec!["PG".to_string(), "SG".to_string()];
        assert!(!can_fill_slot(&eligible, "QB"));
    }
}
