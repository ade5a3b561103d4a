//! DeployBot - deployment lifecycle notifications for chat
//!
//! This library turns Cloud Deploy release and rollout events into rich
//! Slack or Google Chat messages and delivers them.

pub mod cli;
pub mod config;
pub mod core;
pub mod event;
pub mod notification;
pub mod server;
pub mod services;

// Re-export core types for convenience
pub use crate::core::{ChatAdapter, EventAttributes, ResourceType, Status};
