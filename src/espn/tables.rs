use once_cell::sync::Lazy;
use std::collections::HashMap;

/// ESPN's numeric position id → NBA position label (spec §4.5 step 4).
pub static POSITION_ID_MAP: Lazy<HashMap<i64, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (0, "PG"),
        (1, "SG"),
        (2, "SF"),
        (3, "PF"),
        (4, "C"),
        (5, "G"),
        (6, "F"),
        (7, "SG/SF"),
        (8, "G/F"),
        (9, "PF/C"),
        (10, "UTIL"),
        (11, "BE"),
        (12, "IR"),
    ])
});

pub fn position_label(position_id: i64) -> &'static str {
    POSITION_ID_MAP.get(&position_id).copied().unwrap_or("UTIL")
}

/// ESPN's numeric pro-team id → abbreviation, for display purposes only;
/// scoring logic uses the raw id (spec §4.5 step 4).
pub static PRO_TEAM_ABBREV_MAP: Lazy<HashMap<i64, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (1, "ATL"),
        (2, "BOS"),
        (3, "NOP"),
        (4, "CHI"),
        (5, "CLE"),
        (6, "DAL"),
        (7, "DEN"),
        (8, "DET"),
        (9, "GSW"),
        (10, "HOU"),
        (11, "IND"),
        (12, "LAC"),
        (13, "LAL"),
        (14, "MIA"),
        (15, "MIL"),
        (16, "MIN"),
        (17, "BKN"),
        (18, "NYK"),
        (19, "ORL"),
        (20, "PHI"),
        (21, "PHX"),
        (22, "POR"),
        (23, "SAC"),
        (24, "SAS"),
        (25, "OKC"),
        (26, "UTA"),
        (27, "WAS"),
        (28, "TOR"),
        (29, "MEM"),
        (30, "CHA"),
    ])
});

pub fn pro_team_abbrev(pro_team_id: i64) -> &'static str {
    PRO_TEAM_ABBREV_MAP.get(&pro_team_id).copied().unwrap_or("FA")
}
