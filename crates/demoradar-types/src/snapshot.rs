//! Canonical player snapshots and the payload streamed to the radar.
//!
//! A [`PlayerSnapshot`] is the typed form of one [`RawTickRow`]; an
//! [`OutboundPayload`] bundles the snapshots of a single tick together with
//! the source they came from. Both serialize to the exact JSON shape the
//! radar frontend consumes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coerce::{coerce_bool, coerce_float, coerce_int, coerce_text};
use crate::raw::RawTickRow;

/// Name used when a row carries no display name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// The typed state of one player at one tick.
///
/// Every field except `name` is nullable: `None` means the value was
/// missing or could not be coerced, which is distinct from `false` or `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerSnapshot {
    /// Display name, [`UNKNOWN_NAME`] when absent.
    pub name: String,
    /// Persistent account identifier.
    #[ts(type = "number | null")]
    pub steamid: Option<i64>,
    /// Player slot identifier, unique within a snapshot.
    #[ts(type = "number | null")]
    pub entity_id: Option<i64>,
    /// Team number.
    #[ts(type = "number | null")]
    pub team_num: Option<i64>,
    /// Alive flag as the integer `0` or `1`.
    #[ts(type = "number | null")]
    pub is_alive: Option<i64>,
    /// Hit points.
    #[ts(type = "number | null")]
    pub health: Option<i64>,
    /// Armor points.
    #[ts(type = "number | null")]
    pub armor_value: Option<i64>,
    /// Helmet flag.
    pub has_helmet: Option<bool>,
    /// Defuse kit flag.
    pub has_defuser: Option<bool>,
    /// Currently defusing flag.
    pub is_defusing: Option<bool>,
    /// Crouching flag.
    pub ducked: Option<bool>,
    /// In-game currency balance.
    #[ts(type = "number | null")]
    pub balance: Option<i64>,
    /// Assigned player colour.
    pub player_color: Option<String>,
    /// Map callout of the last known place.
    pub last_place_name: Option<String>,
    /// World X coordinate.
    #[serde(rename = "X")]
    pub x: Option<f64>,
    /// World Y coordinate.
    #[serde(rename = "Y")]
    pub y: Option<f64>,
    /// World Z coordinate.
    #[serde(rename = "Z")]
    pub z: Option<f64>,
}

impl PlayerSnapshot {
    /// Coerce every tracked column of `row` to its semantic type.
    pub fn from_row(row: &RawTickRow) -> Self {
        Self {
            name: coerce_text(row.name.as_ref()).unwrap_or_else(|| UNKNOWN_NAME.to_owned()),
            steamid: coerce_int(row.steamid.as_ref()),
            entity_id: coerce_int(row.entity_id.as_ref()),
            team_num: coerce_int(row.team_num.as_ref()),
            is_alive: coerce_bool(row.is_alive.as_ref()).map(i64::from),
            health: coerce_int(row.health.as_ref()),
            armor_value: coerce_int(row.armor_value.as_ref()),
            has_helmet: coerce_bool(row.has_helmet.as_ref()),
            has_defuser: coerce_bool(row.has_defuser.as_ref()),
            is_defusing: coerce_bool(row.is_defusing.as_ref()),
            ducked: coerce_bool(row.ducked.as_ref()),
            balance: coerce_int(row.balance.as_ref()),
            player_color: coerce_text(row.player_color.as_ref()),
            last_place_name: coerce_text(row.last_place_name.as_ref()),
            x: coerce_float(row.x.as_ref()),
            y: coerce_float(row.y.as_ref()),
            z: coerce_float(row.z.as_ref()),
        }
    }

    /// Alive state as a boolean; `None` when unknown.
    pub fn alive(&self) -> Option<bool> {
        self.is_alive.map(|v| v != 0)
    }
}

/// One message on the radar stream: every tracked player at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OutboundPayload {
    /// Identifier of the replay source (the path or name given at startup).
    pub demo: String,
    /// Tick shared by every snapshot in `players`.
    #[ts(type = "number")]
    pub tick: i64,
    /// Player snapshots ordered by entity id ascending.
    pub players: Vec<PlayerSnapshot>,
}

impl OutboundPayload {
    /// Encode as a UTF-8 JSON text message. Non-ASCII names are written
    /// as-is rather than escaped.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a payload previously produced by [`OutboundPayload::to_json`].
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `text` is not a valid payload.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::raw::RawValue;

    fn full_row() -> RawTickRow {
        RawTickRow {
            tick: Some(RawValue::Int(4100)),
            x: Some(RawValue::Float(-412.5)),
            y: Some(RawValue::Float(1873.0)),
            z: Some(RawValue::Int(-160)),
            health: Some(RawValue::Int(74)),
            is_alive: Some(RawValue::Bool(true)),
            balance: Some(RawValue::Float(3250.0)),
            player_color: Some(RawValue::Int(2)),
            has_defuser: Some(RawValue::Bool(false)),
            has_helmet: Some(RawValue::Bool(true)),
            is_defusing: Some(RawValue::Bool(false)),
            armor_value: Some(RawValue::Int(100)),
            last_place_name: Some(RawValue::Text("BombsiteB".to_owned())),
            entity_id: Some(RawValue::Int(3)),
            steamid: Some(RawValue::Text("76561198034202275".to_owned())),
            name: Some(RawValue::Text("ropz".to_owned())),
            team_num: Some(RawValue::Int(3)),
            ducked: Some(RawValue::Int(0)),
            is_connected: Some(RawValue::Int(0)),
        }
    }

    #[test]
    fn from_row_coerces_every_field() {
        let snap = PlayerSnapshot::from_row(&full_row());
        assert_eq!(snap.name, "ropz");
        assert_eq!(snap.steamid, Some(76_561_198_034_202_275));
        assert_eq!(snap.entity_id, Some(3));
        assert_eq!(snap.is_alive, Some(1));
        assert_eq!(snap.balance, Some(3250));
        assert_eq!(snap.player_color.as_deref(), Some("2"));
        assert_eq!(snap.has_helmet, Some(true));
        assert_eq!(snap.ducked, Some(false));
        assert_eq!(snap.z, Some(-160.0));
        assert_eq!(snap.alive(), Some(true));
    }

    #[test]
    fn missing_helmet_is_null_not_false() {
        let row = RawTickRow {
            has_helmet: None,
            ..full_row()
        };
        let snap = PlayerSnapshot::from_row(&row);
        assert_eq!(snap.has_helmet, None);
    }

    #[test]
    fn empty_row_yields_placeholder_name_and_nulls() {
        let snap = PlayerSnapshot::from_row(&RawTickRow::default());
        assert_eq!(snap.name, UNKNOWN_NAME);
        assert_eq!(snap.entity_id, None);
        assert_eq!(snap.alive(), None);
        assert_eq!(snap.last_place_name, None);
    }

    #[test]
    fn payload_uses_radar_field_names() {
        let payload = OutboundPayload {
            demo: "match.json".to_owned(),
            tick: 4100,
            players: vec![PlayerSnapshot::from_row(&full_row())],
        };
        let value: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        let player = &value["players"][0];
        assert_eq!(value["tick"], 4100);
        assert_eq!(player["X"], -412.5);
        assert_eq!(player["is_alive"], 1);
        assert!(player.get("x").is_none());
    }

    #[test]
    fn payload_round_trips_with_order_preserved() {
        let mut second = PlayerSnapshot::from_row(&RawTickRow::default());
        second.entity_id = Some(9);
        second.name = "Żółw".to_owned();
        let payload = OutboundPayload {
            demo: "demo_7.json".to_owned(),
            tick: 11,
            players: vec![PlayerSnapshot::from_row(&full_row()), second],
        };
        let text = payload.to_json().unwrap();
        assert!(text.contains("Żółw"));
        assert_eq!(OutboundPayload::from_json(&text).unwrap(), payload);
    }

    #[test]
    fn alive_flag_is_zero_or_one() {
        let alive = |cell: RawValue| {
            let row = RawTickRow {
                is_alive: Some(cell),
                ..RawTickRow::default()
            };
            let snap = PlayerSnapshot::from_row(&row);
            (snap.is_alive, snap.alive())
        };
        assert_eq!(alive(RawValue::Int(5)), (Some(1), Some(true)));
        assert_eq!(alive(RawValue::Int(0)), (Some(0), Some(false)));
        assert_eq!(alive(RawValue::Float(0.5)), (Some(1), Some(true)));
        assert_eq!(alive(RawValue::Text("True".to_owned())), (Some(1), Some(true)));
        assert_eq!(alive(RawValue::Text("dead".to_owned())), (None, None));
    }

    #[test]
    fn full_precision_coordinates_survive_round_trip() {
        let mut player = PlayerSnapshot::from_row(&RawTickRow::default());
        player.x = Some(-926.760_585_179_803_9);
        player.y = Some(2_417.093_127_450_012_6);
        player.z = Some(-0.000_123_456_789_012_345_67);
        let payload = OutboundPayload {
            demo: "demo_1.json".to_owned(),
            tick: 1,
            players: vec![player],
        };
        let decoded = OutboundPayload::from_json(&payload.to_json().unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    fn arb_player() -> impl Strategy<Value = PlayerSnapshot> {
        let ints = proptest::collection::vec(proptest::option::of(any::<i64>()), 6);
        let flags = proptest::collection::vec(proptest::option::of(any::<bool>()), 4);
        let coords = proptest::collection::vec(proptest::option::of(-4096.0f64..4096.0), 3);
        let texts = (
            "\\PC{0,20}",
            proptest::option::of("[a-zA-Z ]{0,12}"),
            proptest::option::of("\\PC{0,16}"),
        );
        (ints, flags, coords, texts, proptest::option::of(0i64..=1)).prop_map(
            |(ints, flags, coords, (name, color, place), is_alive)| {
                let int = |i: usize| ints.get(i).copied().flatten();
                let flag = |i: usize| flags.get(i).copied().flatten();
                let coord = |i: usize| coords.get(i).copied().flatten();
                PlayerSnapshot {
                    name,
                    steamid: int(0),
                    entity_id: int(1),
                    team_num: int(2),
                    is_alive,
                    health: int(3),
                    armor_value: int(4),
                    has_helmet: flag(0),
                    has_defuser: flag(1),
                    is_defusing: flag(2),
                    ducked: flag(3),
                    balance: int(5),
                    player_color: color,
                    last_place_name: place,
                    x: coord(0),
                    y: coord(1),
                    z: coord(2),
                }
            },
        )
    }

    proptest! {
        #[test]
        fn any_payload_round_trips(
            demo in "\\PC{0,24}",
            tick in any::<i64>(),
            players in proptest::collection::vec(arb_player(), 0..12),
        ) {
            let payload = OutboundPayload { demo, tick, players };
            let text = payload.to_json().unwrap();
            prop_assert_eq!(OutboundPayload::from_json(&text).unwrap(), payload);
        }
    }
}
