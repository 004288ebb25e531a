//! # Matriculas Rust Backend
//!
//! Enrollment ("matrícula") management backend: binds students to teachers,
//! subjects, a pricing model and a weekly time schedule allocated to
//! physical or virtual classrooms.
//!
//! The hard part is not CRUD but keeping the scheduling and pricing rules
//! consistent: duplicate time-slot detection per room and per modality,
//! billable-hours derivation from slot durations, and tax/material pricing —
//! all held together across create/update/cascading-delete transactions
//! that touch several linked records atomically.
//!
//! ## Architecture
//!
//! - [`api`]: identifier newtypes and lightweight listing DTOs
//! - [`models`]: domain entities, time-of-day arithmetic, partial-update merge
//! - [`services`]: conflict detector, pricing engine, slot and enrollment
//!   services
//! - [`db`]: repository traits, error types, and the swappable storage
//!   backends (in-memory local, Diesel/Postgres)
//! - [`http`]: axum REST surface (feature `http-server`)

pub mod api;

pub mod db;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
