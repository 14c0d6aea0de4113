//! Core use-case services.
//!
//! # Responsibility
//! - Turn user intents into validated state changes plus persistence writes.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod todo_store;
