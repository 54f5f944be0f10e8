pub mod group_store;
pub mod inventory;
pub mod request_write;
pub mod sheet;
