pub mod auth;
pub mod composer;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod membership;
pub mod search;
pub mod shopping_list;
