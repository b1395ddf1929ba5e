pub mod api;
pub mod commands;
pub mod demo;
pub mod domain;
pub mod http;
pub mod runtime;
pub mod session;
pub mod validation;
