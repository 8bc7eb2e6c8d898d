//! Background loops

pub mod poller;
