//! Request handlers

pub mod expenses;
pub mod rules;
pub mod health;
