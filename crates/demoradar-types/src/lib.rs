//! Shared type definitions for the demoradar bridge.
//!
//! This crate owns the data model that flows through the pipeline:
//! untyped rows as the external demo parser emits them, the typed player
//! snapshot they are coerced into, and the payload streamed to the radar.
//! Types that reach the radar frontend are exported to `TypeScript` via
//! `ts-rs`.
//!
//! # Modules
//!
//! - [`raw`] -- Untyped per-tick rows and the requested column list
//! - [`coerce`] -- Total coercion functions from raw values to typed values
//! - [`snapshot`] -- Canonical player snapshot and outbound payload

pub mod coerce;
pub mod raw;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use coerce::{coerce_bool, coerce_float, coerce_int, coerce_text};
pub use raw::{RawTickRow, RawValue, TICK_FIELDS, TickTable};
pub use snapshot::{OutboundPayload, PlayerSnapshot, UNKNOWN_NAME};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the radar client.

    #[test]
    fn export_bindings() {
        // Writes the bindings into `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::snapshot::PlayerSnapshot::export_all();
        let _ = crate::snapshot::OutboundPayload::export_all();
    }
}
