pub mod clients;
pub mod config;
pub mod db;
pub mod events;
pub mod health;
pub mod models;
pub mod repos;
pub mod routes;
pub mod services;
pub mod validation;
