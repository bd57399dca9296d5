pub mod auth;
pub mod email;
pub mod notifier;
pub mod processo_service;
pub mod webhook;
pub mod whatsapp;
