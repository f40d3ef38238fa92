//! Sensor subsystem: sampling, permission, processing and detection.
//!
//! ```text
//! platform ─▶ sampler (queue) ─▶ processor (delta + EMA) ─▶ detector (> threshold)
//!                ▲
//!          permission gate
//! ```
//!
//! The [`SessionController`](crate::app::service::SessionController) owns
//! one of each and drives them once per sample.

pub mod detector;
pub mod permission;
pub mod processor;
pub mod sampler;
