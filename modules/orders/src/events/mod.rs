pub mod order_created;
pub mod publisher;
