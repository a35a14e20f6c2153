//! Core types and definitions for the WARFRONT combat engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry, components, enums, tuning constants and configuration.
//! It has no dependency on the ECS or any runtime framework.

pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod types;
