//! Kumo Cloud HVAC device manager.
//!
//! Layers, inner to outer: `domain` (pure types and rules), `application`
//! (credential and device services), `infrastructure` (filesystem, prompts,
//! cloud client, wiring) and `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
