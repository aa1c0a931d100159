// src/services.rs

pub mod admin_service;
pub mod auth;
pub mod confirmation_service;
pub mod dashboard_service;
pub mod directory_service;
pub mod document_service;
pub mod export_service;
pub mod payment_service;
pub mod registration_service;
pub mod registration_wizard;
pub mod storage;
