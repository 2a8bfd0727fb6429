//! Client library for the MetaScan warehouse-inventory API.
//!
//! The core is the authenticated-session state machine: a token store, the
//! login/refresh client, the session controller and the [`api::ApiClient`]
//! interceptor that silently refreshes expired access tokens and escalates
//! unsalvageable sessions to a logout.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod utils;
