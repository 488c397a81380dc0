//! HTTP handlers, grouped by API area.

pub mod envs;
pub mod repos;
