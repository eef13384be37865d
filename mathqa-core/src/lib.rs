//! MathQA Core
//!
//! Core types for the MathQA batch evaluation client.
//!
//! This crate contains:
//! - Domain types: the tracked batch job entity and its results
//! - DTOs: wire formats exchanged with the evaluation backend

pub mod domain;
pub mod dto;
