//! # VanceAI SDK for Rust
//!
//! Rust client for the [VanceAI](https://vanceai.com/api-docs/) image
//! transformation API. Upload images, submit transformation jobs, poll for
//! completion, and download results -- all with idiomatic async Rust.
//!
//! ## Quick start
//!
//! ```no_run
//! use vanceai::{Client, EnlargeOptions};
//!
//! #[tokio::main]
//! async fn main() -> vanceai::Result<()> {
//!     let client = Client::new("your_api_token");
//!
//!     // Enlarge 2x and wait for the result
//!     let output = client
//!         .enlarge("photo.jpg", &EnlargeOptions::default(), None)
//!         .await?;
//!     println!("Enlarged image written to {}", output.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Step-by-step control
//!
//! ```no_run
//! use vanceai::{Client, EnlargeOptions, JobConfig};
//!
//! # async fn example() -> vanceai::Result<()> {
//! let client = Client::new("your_api_token");
//!
//! let config = JobConfig::enlarge(&EnlargeOptions::default())?;
//! let uid = client.upload("photo.jpg").await?;
//! let job = client.transform(&uid, &config, None).await?;
//!
//! let status = client.progress(&job.trans_id).await?;
//! if status.is_finished() {
//!     client.download(&job.trans_id, "enlarged.jpg").await?;
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod errors;
mod models;
mod scale;

pub use client::{Client, ClientBuilder};
pub use config::{EnlargeOptions, JobConfig, JobConfigBuilder};
pub use errors::{error_message, Result, VanceError};
pub use models::{ProcessOptions, Status, TransformResult};
pub use scale::{scale_for_dimensions, EnlargeScale};
