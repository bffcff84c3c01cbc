pub mod employee;
pub mod health;
pub mod punch;
pub mod store;
