pub mod cart_archive;
pub mod memory;
pub mod rest;
pub mod rows;
