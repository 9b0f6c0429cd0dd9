//! Registration document enhancement and structured field extraction.
//!
//! Uploaded scans are normalised, denoised by a small residual CNN, sharpened
//! and contrast-equalised, then handed to a vision-capable LLM whose free-form
//! reply is recovered into a validated record.

pub mod api;
pub mod config;
pub mod denoise;
pub mod enhance;
pub mod error;
pub mod llm;
pub mod models;
pub mod recovery;
pub mod services;
pub mod storage;
