//! # Daemon Module
//!
//! Background services of the PCF8591 plugin.
//!
//! ## Components
//!
//! * **Sampler**: the sampling loop and its trigger handle
//! * **Shared State**: status text, last readings and loop phase read by
//!   request handlers
//! * **Launch Daemon**: starts the plugin and a heartbeat from the service
//!   configuration and shuts them down on request
//!
//! ## Usage
//!
//! ```no_run
//! use rust_pcf8591::{config::Config, daemon::launch_daemon::Daemon};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!
//!     let mut daemon = Daemon::new();
//!     daemon.launch(&config)?;
//!
//!     // Wait for shutdown signal (e.g., Ctrl+C)
//!     tokio::signal::ctrl_c().await?;
//!
//!     daemon.shutdown();
//!     daemon.join().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod launch_daemon;
pub mod sampler;
pub mod shared_state;

pub use sampler::{Sampler, SamplerHandle};
pub use shared_state::{SamplerPhase, SamplerState, SharedSamplerState, StatusReporter};
