//! Fixed-width console table for the current tick.
//!
//! Purely presentational: nothing here affects the payload sent to the
//! radar. Colour codes are applied after a cell has been fitted to its
//! column, so widths are the same with and without colour.

use std::io::{self, Write};

use crossterm::{cursor, execute, terminal};
use demoradar_types::PlayerSnapshot;
use owo_colors::{AnsiColors, OwoColorize};

/// Token printed for unavailable values.
pub const PLACEHOLDER: &str = "(n/a)";

/// Separator between columns.
const SEPARATOR: &str = " | ";

/// Team number of the counter-terrorist side.
const TEAM_CT: i64 = 3;

/// Team number of the terrorist side.
const TEAM_T: i64 = 2;

/// Column headers and their display widths, in print order.
pub const COLUMNS: [(&str, usize); 15] = [
    ("Name", 15),
    ("HP", 5),
    ("Armor", 6),
    ("Helmet", 6),
    ("X", 8),
    ("Y", 8),
    ("Z", 8),
    ("LastPlace", 12),
    ("Balance", 7),
    ("Defuser", 8),
    ("Defusing", 8),
    ("Ducked", 6),
    ("Color", 8),
    ("ID", 5),
    ("Alive", 6),
];

/// Rendering switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Wrap coloured cells in ANSI escape codes.
    pub color: bool,
    /// Banner title.
    pub title: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: true,
            title: "Radar".to_owned(),
        }
    }
}

/// Fit `text` to exactly `width` characters: truncate longer text,
/// right-pad shorter text with spaces.
pub fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(len)));
    out
}

/// Banner line printed above the table.
pub fn render_banner(title: &str, demo: &str, tick: i64) -> String {
    format!("===== {title}: {demo} | Tick: {tick} =====")
}

/// Render the header, a dash rule, and one line per player.
pub fn render_table(players: &[PlayerSnapshot], options: &RenderOptions) -> Vec<String> {
    let header = COLUMNS
        .iter()
        .map(|(name, width)| fit(name, *width))
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    let rule = "-".repeat(header.chars().count());

    let mut lines = Vec::with_capacity(players.len().saturating_add(2));
    lines.push(header);
    lines.push(rule);
    lines.extend(players.iter().map(|p| render_row(p, options)));
    lines
}

/// Render one player line.
pub fn render_row(player: &PlayerSnapshot, options: &RenderOptions) -> String {
    let alive = player.alive();
    let cells = [
        (player.name.clone(), name_tint(alive, player.team_num)),
        (opt(player.health), health_tint(alive)),
        (opt(player.armor_value), None),
        (opt(player.has_helmet), None),
        (coord(player.x), None),
        (coord(player.y), None),
        (coord(player.z), None),
        (opt(player.last_place_name.as_deref()), None),
        (opt(player.balance), None),
        (opt(player.has_defuser), None),
        (opt(player.is_defusing), defusing_tint(player.is_defusing)),
        (opt(player.ducked), None),
        (opt(player.player_color.as_deref()), None),
        (opt(player.entity_id), None),
        (opt(alive), None),
    ];

    cells
        .iter()
        .zip(COLUMNS.iter())
        .map(|((text, tint), (_, width))| {
            let cell = fit(text, *width);
            match tint {
                Some(color) if options.color => cell.color(*color).to_string(),
                _ => cell,
            }
        })
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Clear the terminal and move the cursor home.
///
/// # Errors
///
/// Returns the I/O error from the underlying writer.
pub fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))
}

/// Name colour: by team while alive, dimmed otherwise.
pub const fn name_tint(alive: Option<bool>, team: Option<i64>) -> Option<AnsiColors> {
    match (alive, team) {
        (Some(true), Some(TEAM_CT)) => Some(AnsiColors::Cyan),
        (Some(true), Some(TEAM_T)) => Some(AnsiColors::Yellow),
        (Some(true), _) => Some(AnsiColors::Red),
        _ => Some(AnsiColors::BrightBlack),
    }
}

/// Health colour: green alive, red dead, plain when unknown.
pub const fn health_tint(alive: Option<bool>) -> Option<AnsiColors> {
    match alive {
        Some(true) => Some(AnsiColors::Green),
        Some(false) => Some(AnsiColors::Red),
        None => None,
    }
}

/// Defusing is highlighted only while true.
pub const fn defusing_tint(defusing: Option<bool>) -> Option<AnsiColors> {
    match defusing {
        Some(true) => Some(AnsiColors::Yellow),
        _ => None,
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_owned(), |v| v.to_string())
}

fn coord(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_owned(), |v| format!("{v:.2}"))
}
