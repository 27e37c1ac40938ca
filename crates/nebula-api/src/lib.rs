// nebula-api: Async Rust client for the Pi-hole v6 session API

pub mod appliance;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod teleporter;
pub mod transport;

pub use appliance::Appliance;
pub use client::{SessionClient, USER_AGENT};
pub use error::{Error, ErrorKind};
pub use models::{ConfigDocument, GravitySelector, ImportSelector};
pub use transport::{TlsMode, TransportConfig};
