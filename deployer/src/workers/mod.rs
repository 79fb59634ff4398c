//! Background workers

pub mod keepalive;
