//! Farewatch Library
//!
//! Cache-backed airfare monitoring: resolve destination codes, search route
//! prices, classify them against target prices and notify subscribers.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod monitor;
pub mod notify;
pub mod resolver;
pub mod search;
