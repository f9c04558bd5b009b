//! `smolmsg`: small messages stored as plain files.
//!
//! This crate provides the streaming codec for the smolmsg format, the
//! content-derived message identifiers, and helpers for reading message
//! files and their attachments.

pub mod config;
pub mod error;
pub mod export;
pub mod id;
pub mod model;
pub mod parser;
pub mod store;
