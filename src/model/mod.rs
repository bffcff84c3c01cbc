pub mod employee;
pub mod punch;
pub mod role;
pub mod store;
pub mod user;
