//! Frontend settings service
//!
//! Assembles the bootstrap settings a web frontend loads before rendering:
//! resolved data sources, the panel catalog, preload modules, build and
//! license info, and server feature flags.

pub mod api;
pub mod config;
pub mod context;
pub mod crypto;
pub mod datasources;
pub mod entity;
pub mod licensing;
pub mod panels;
pub mod plugins;
pub mod settings;
