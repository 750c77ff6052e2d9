pub mod accounts;
pub mod admin;
pub mod cart_store;
pub mod catalog;
pub mod checkout;
