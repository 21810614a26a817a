#![allow(dead_code)]

pub mod service;
pub mod strategies;

pub use service::*;
