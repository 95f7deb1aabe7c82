//! ESPN Client (spec §4.5, §6 / C3): typed accessor to ESPN fantasy
//! endpoints with retry/backoff and cookie support for private leagues.

pub mod client;
pub mod tables;

pub use client::EspnClient;
pub use tables::{position_label, pro_team_abbrev};
