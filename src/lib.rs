//! Telegram translation bot: command dispatch over a remote translation
//! provider, with usage stats and feedback persisted in SQLite.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod system;
pub mod telegram;
pub mod translator;
