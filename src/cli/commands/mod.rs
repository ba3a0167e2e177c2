pub mod config;
pub mod db;
pub mod events;
pub mod init;
pub mod log;
pub mod run;
pub mod sanctions;
pub mod schedule;
