pub mod config;
pub mod data;
pub mod db;
pub mod seed;
