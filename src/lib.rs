// ABOUTME: Library module for catalog-single-store-migrator
// ABOUTME: Exports the reconciler, orchestrator, storage backends and CLI commands

pub mod commands;
pub mod config;
pub mod error;
pub mod migration;
pub mod postgres;
pub mod sqlite;
pub mod store;
pub mod utils;
