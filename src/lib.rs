//! Microblog backend: users, a directed follow graph, and the activity feed
//! built from it, served over axum with a pluggable persistence store.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod microposts;
pub mod social;
pub mod state;
pub mod store;
pub mod users;
