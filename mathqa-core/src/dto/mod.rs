//! Wire formats for the evaluation backend
//!
//! This module contains the JSON shapes the backend actually sends and
//! receives. The two status endpoints disagree on field naming, so each
//! response type converts into the canonical [`batch::StatusUpdate`]
//! before anything downstream looks at it.

pub mod batch;
pub mod chat;
