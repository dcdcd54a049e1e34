//! Untyped per-tick rows as produced by the external demo parser.
//!
//! The parser emits one row per `(tick, entity)` pair. Every column is
//! nullable and loosely typed at the source: a health value may arrive as
//! an integer, a float, a numeric string, or not at all. [`RawTickRow`]
//! keeps each tracked column as an `Option<RawValue>` so that typing is
//! deferred to the coercion functions in [`crate::coerce`].

use std::fmt;

use serde_json::{Map, Value};

/// Column names requested from the parser each poll cycle.
///
/// The parser always adds `tick` on its own, so it is not listed here.
pub const TICK_FIELDS: [&str; 18] = [
    "X",
    "Y",
    "Z",
    "health",
    "is_alive",
    "balance",
    "player_color",
    "has_defuser",
    "has_helmet",
    "is_defusing",
    "armor_value",
    "last_place_name",
    "entity_id",
    "steamid",
    "name",
    "team_num",
    "ducked",
    "is_connected",
];

/// A single non-null cell value.
///
/// Null and missing cells are represented by `None` at the use site, never
/// by a variant of this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A boolean cell.
    Bool(bool),
    /// An integral numeric cell.
    Int(i64),
    /// A floating-point numeric cell (may be non-finite).
    Float(f64),
    /// A textual cell.
    Text(String),
}

impl RawValue {
    /// Convert a JSON value into a raw cell.
    ///
    /// `null` maps to `None`. Integers that do not fit in `i64` fall back to
    /// [`RawValue::Float`]. Arrays and objects are kept as their JSON text so
    /// that numeric coercion later rejects them.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Some(Self::Text(value.to_string())),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One parser row: the state of one entity at one tick.
///
/// Field names follow the parser's column names; the position columns are
/// upper-case at the source (see [`TICK_FIELDS`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTickRow {
    /// Simulation tick this row belongs to.
    pub tick: Option<RawValue>,
    /// World X coordinate.
    pub x: Option<RawValue>,
    /// World Y coordinate.
    pub y: Option<RawValue>,
    /// World Z coordinate.
    pub z: Option<RawValue>,
    /// Hit points.
    pub health: Option<RawValue>,
    /// Alive flag.
    pub is_alive: Option<RawValue>,
    /// In-game currency balance.
    pub balance: Option<RawValue>,
    /// Assigned player colour.
    pub player_color: Option<RawValue>,
    /// Defuse kit flag.
    pub has_defuser: Option<RawValue>,
    /// Helmet flag.
    pub has_helmet: Option<RawValue>,
    /// Currently defusing flag.
    pub is_defusing: Option<RawValue>,
    /// Armor points.
    pub armor_value: Option<RawValue>,
    /// Map callout of the last known place.
    pub last_place_name: Option<RawValue>,
    /// Per-tick-stable player slot identifier.
    pub entity_id: Option<RawValue>,
    /// Persistent account identifier.
    pub steamid: Option<RawValue>,
    /// Display name.
    pub name: Option<RawValue>,
    /// Team number.
    pub team_num: Option<RawValue>,
    /// Crouching flag.
    pub ducked: Option<RawValue>,
    /// Connectivity flag used by the snapshot filter.
    pub is_connected: Option<RawValue>,
}

impl RawTickRow {
    /// Project a JSON record (one row object) onto the tracked columns.
    ///
    /// Columns not present in the record stay `None`; unknown keys are
    /// ignored.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let cell = |name: &str| record.get(name).and_then(RawValue::from_json);
        Self {
            tick: cell("tick"),
            x: cell("X"),
            y: cell("Y"),
            z: cell("Z"),
            health: cell("health"),
            is_alive: cell("is_alive"),
            balance: cell("balance"),
            player_color: cell("player_color"),
            has_defuser: cell("has_defuser"),
            has_helmet: cell("has_helmet"),
            is_defusing: cell("is_defusing"),
            armor_value: cell("armor_value"),
            last_place_name: cell("last_place_name"),
            entity_id: cell("entity_id"),
            steamid: cell("steamid"),
            name: cell("name"),
            team_num: cell("team_num"),
            ducked: cell("ducked"),
            is_connected: cell("is_connected"),
        }
    }
}

/// A parser result: rows spanning any number of ticks and entities, in
/// the order the parser emitted them.
pub type TickTable = Vec<RawTickRow>;
