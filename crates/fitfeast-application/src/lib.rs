//! Application layer for FitFeast.
//!
//! This crate provides use case implementations that coordinate between
//! domain and infrastructure layers to implement application-level business logic.

pub mod log_flow;

pub use log_flow::{FlowError, LogFlowUseCase, NETWORK_BANNER, NO_FOOD_BANNER, Screen};
