//! Flutter-facing bindings for WorkTrip core.

pub mod api;
