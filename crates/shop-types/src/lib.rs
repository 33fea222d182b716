//! shop-types: domain entities and ports for the shop admin backend

pub mod domain;
pub mod ports;
