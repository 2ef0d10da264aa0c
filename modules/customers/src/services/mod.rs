pub mod order_counter_service;
