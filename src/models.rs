pub mod auth;
pub mod dashboard;
pub mod directory;
pub mod event;
pub mod payment;
pub mod registration;
