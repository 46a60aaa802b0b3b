//! restock-api Library
//!
//! Core engine for demand-driven inventory replenishment, supplier
//! order lifecycle management, and payment settlement.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod request_context;
pub mod services;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Versioned API surface: replenishment scan, order lifecycle
/// transitions, payment settlement, and the inventory read model.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(handlers::reorder::reorder_routes())
        .merge(handlers::orders::order_routes())
        .merge(handlers::payments::payment_routes())
        .merge(handlers::inventory::inventory_routes())
}
