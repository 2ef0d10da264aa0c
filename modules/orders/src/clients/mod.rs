pub mod customer_client;
