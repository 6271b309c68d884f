//! Polls the Practicum homework-review API and relays status changes for
//! the most recent submission to a Telegram chat.

#![deny(rust_2018_idioms)]

pub mod config;
pub mod poller;
pub mod practicum;
pub mod telegram;
