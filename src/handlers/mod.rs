//! JSON API handlers

pub mod health;
pub mod items;
pub mod movements;
pub mod reports;
pub mod suppliers;
