//! Commands of the `gpkedit` tool for inspecting and bulk editing GPK packages

pub mod commands;
