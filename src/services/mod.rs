//! Services Layer
//!
//! This module contains pure business logic extracted from HTTP handlers.

pub mod contact_service;
