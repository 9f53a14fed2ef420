pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod repository;
pub mod vin;
