//! RocketShoes Storefront library.
//!
//! Client-side storefront logic: the shopping cart state machine, its durable
//! persistence, and the stock and catalog API it validates against.
//!
//! # Modules
//!
//! - [`services::cart`] - the cart state machine
//! - [`persistence`] - cart serialization under a fixed storage key
//! - [`store`] - durable key-value backends
//! - [`catalog`] - stock oracle and product catalog client
//! - [`notify`] - user-facing notification sinks
//! - [`models`] - display models (cart view, product listing)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod persistence;
pub mod services;
pub mod state;
pub mod store;
