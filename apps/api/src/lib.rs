//! CV Maker core: the résumé revision session controller and the ingress
//! proxy that fronts the enhancement service.
//!
//! The library target carries everything a front end needs to embed the
//! revision workflow ([`session::Session`]); the `api` binary serves the
//! proxy router from [`routes::build_router`].

pub mod config;
pub mod enhancer;
pub mod errors;
pub mod routes;
pub mod session;
pub mod state;
