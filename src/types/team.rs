//! Team code lookup for display

/// Accent color used for teams without a known livery.
pub const DEFAULT_TEAM_COLOR: &str = "#00D2BE";

const TEAMS: &[(&str, &str, &str)] = &[
    ("MER", "Mercedes", "#00D2BE"),
    ("RBR", "Red Bull Racing", "#3671C6"),
    ("FER", "Ferrari", "#DC0000"),
    ("MCL", "McLaren", "#FF8700"),
    ("AMR", "Aston Martin", "#006F62"),
    ("ALP", "Alpine", "#0090FF"),
    ("WIL", "Williams", "#005AFF"),
    ("ALT", "AlphaTauri", "#2B4562"),
    ("ALF", "Alfa Romeo", "#900000"),
    ("HAA", "Haas", "#FFFFFF"),
];

/// Display name for a team code; unknown codes are returned unchanged.
pub fn team_name(code: &str) -> &str {
    TEAMS.iter().find(|(c, _, _)| *c == code).map(|(_, name, _)| *name).unwrap_or(code)
}

/// Livery color for a team code.
pub fn team_color(code: &str) -> &'static str {
    TEAMS
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, _, color)| *color)
        .unwrap_or(DEFAULT_TEAM_COLOR)
}
