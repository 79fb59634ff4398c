//! Deployment session lifecycle

pub mod fsm;
pub mod notify;
pub mod runner;
pub mod service;
