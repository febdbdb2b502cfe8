// src/lib.rs

//! IPO Notifier Library
//!
//! Scrapes a live IPO listing, keeps the offerings that qualify, and mails
//! the ones that have not been announced before.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
