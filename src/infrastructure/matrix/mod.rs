//! Matrix Homeserver Client
//!
//! Implements the `RoomGateway` contract against a homeserver's
//! client-server API.
//!
//! ```rust,ignore
//! use room_mirror::infrastructure::matrix::MatrixGateway;
//!
//! let gateway = MatrixGateway::new(&settings.matrix)?;
//! let directory = gateway.fetch_public_directory().await?;
//! ```

mod client;
mod types;

pub use client::{build_http_client, MatrixGateway};
