//! Replyline - AI-assisted conversation and SMS triage backend
//!
//! Exposes CRUD endpoints for users and preferences, plus two endpoints that
//! forward user text to a language-model provider and persist every
//! interaction as an audit log.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
