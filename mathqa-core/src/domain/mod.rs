//! Core domain types
//!
//! This module contains the canonical batch job entity shared across the
//! MathQA crates. The tracker mutates it, the CLI renders it, and the
//! client never sees it (the client speaks DTOs only).

pub mod job;
