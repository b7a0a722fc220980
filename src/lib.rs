pub mod account;
pub mod api;
pub mod assets;
pub mod catalog;
pub mod config;
pub mod error;
pub mod storage;
