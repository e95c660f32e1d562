// src/lib.rs

//! Cover crawler library
//!
//! Fetches a paginated movie listing, downloads each cover image and saves it
//! under a sanitized filename.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
