// src/handlers.rs

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod directory;
pub mod documents;
pub mod events;
pub mod payments;
pub mod registrations;
