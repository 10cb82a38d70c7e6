// src/lib.rs

//! University catalog client library

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod mappers;
pub mod models;
pub mod query;
pub mod utils;
