//! Snapshot extraction: reduce a multi-tick table to one ordered tick.
//!
//! The parser returns every tick recorded so far. Each cycle only the most
//! recent one matters:
//!
//! 1. Find the highest tick present.
//! 2. Keep rows of that tick.
//! 3. Keep rows that pass the [`ConnectivityFilter`].
//! 4. Keep the first row seen for each entity id.
//! 5. Sort by entity id ascending (rows without an id go last).
//! 6. Coerce each row into a [`PlayerSnapshot`].

use std::collections::HashSet;

use demoradar_types::{PlayerSnapshot, RawTickRow, coerce_int};
use tracing::{debug, trace};

/// Errors that abandon a cycle before any payload is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The parser returned no rows at all.
    #[error("tick table is empty")]
    EmptyTable,

    /// No row carried a usable tick number.
    #[error("no row carries a numeric tick ({rows} rows)")]
    NoTick {
        /// Number of rows inspected.
        rows: usize,
    },
}

/// Which rows count as tracked players, by their `is_connected` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityFilter {
    /// Keep rows whose coerced `is_connected` equals the value.
    Equals(i64),
    /// Keep every row.
    Any,
}

impl Default for ConnectivityFilter {
    fn default() -> Self {
        Self::Equals(0)
    }
}

impl ConnectivityFilter {
    /// Whether `row` passes the filter. A row whose flag is missing or
    /// not numeric never matches an `Equals` filter.
    pub fn accepts(self, row: &RawTickRow) -> bool {
        match self {
            Self::Any => true,
            Self::Equals(expected) => coerce_int(row.is_connected.as_ref()) == Some(expected),
        }
    }
}

/// The typed players of exactly one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSnapshot {
    /// The tick every player belongs to.
    pub tick: i64,
    /// Players ordered by entity id ascending, ids unique.
    pub players: Vec<PlayerSnapshot>,
}

/// Extract the latest tick from `table` as an ordered snapshot.
///
/// A tick where every row fails the connectivity filter produces a
/// snapshot with no players; only an empty or tick-less table is an error.
///
/// # Errors
///
/// Returns [`NormalizeError::EmptyTable`] if `table` has no rows and
/// [`NormalizeError::NoTick`] if no row has a numeric tick.
pub fn normalize(
    table: &[RawTickRow],
    filter: ConnectivityFilter,
) -> Result<TickSnapshot, NormalizeError> {
    if table.is_empty() {
        return Err(NormalizeError::EmptyTable);
    }

    let latest_tick = table
        .iter()
        .filter_map(|row| coerce_int(row.tick.as_ref()))
        .max()
        .ok_or_else(|| NormalizeError::NoTick { rows: table.len() })?;

    let mut seen: HashSet<Option<i64>> = HashSet::new();
    let mut rows: Vec<(Option<i64>, &RawTickRow)> = table
        .iter()
        .filter(|row| coerce_int(row.tick.as_ref()) == Some(latest_tick))
        .filter(|row| filter.accepts(row))
        .map(|row| (coerce_int(row.entity_id.as_ref()), row))
        .filter(|(id, _)| seen.insert(*id))
        .collect();

    // Stable sort; `None` ids after every numeric id.
    rows.sort_by_key(|(id, _)| (id.is_none(), *id));

    trace!(
        tick = latest_tick,
        total_rows = table.len(),
        kept = rows.len(),
        "normalized tick table"
    );
    if rows.is_empty() {
        debug!(tick = latest_tick, ?filter, "no rows passed the connectivity filter");
    }

    Ok(TickSnapshot {
        tick: latest_tick,
        players: rows
            .into_iter()
            .map(|(_, row)| PlayerSnapshot::from_row(row))
            .collect(),
    })
}
