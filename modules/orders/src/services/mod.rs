pub mod create_service;
