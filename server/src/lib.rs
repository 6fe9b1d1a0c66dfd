//! Backend for recorded interviews: stores interview definitions,
//! ingests candidate submissions with their video recordings, and
//! serves both back to the interview owner.

pub mod auth;
pub mod config;
pub mod db;
pub mod environment;
pub mod errors;
pub mod interview;
pub mod io;
pub mod media;
pub mod normalization;
pub mod routes;
pub mod store;
pub mod submission;
pub mod urls;
