//! Entrega
//!
//! Delivery-area and delivery-fee resolution policies for multi-tenant
//! order-taking flows: named neighborhood zones, distance-band ladders from a
//! store's center point, and the decision records an order flow consumes.

pub mod address;
pub mod bands;
pub mod config;
pub mod decision;
pub mod geo;
pub mod zones;
