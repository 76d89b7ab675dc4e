use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::Config;
use crate::daemon::shared_state::SharedSamplerState;
use crate::plugin::PcfPlugin;

/// Interval between two heartbeat log lines
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Owns the plugin and the auxiliary tasks of the service
pub struct Daemon {
    plugin: Option<Arc<PcfPlugin>>,
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        Daemon {
            plugin: None,
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Start the plugin and the heartbeat based on configuration
    pub fn launch(&mut self, config: &Config) -> Result<Arc<PcfPlugin>> {
        let plugin = Arc::new(PcfPlugin::start(config).context("Failed to start PCF8591 plugin")?);
        self.start_heartbeat(plugin.sampler().shared_state())?;
        self.plugin = Some(plugin.clone());
        Ok(plugin)
    }

    /// The running plugin, once launched
    pub fn plugin(&self) -> Option<Arc<PcfPlugin>> {
        self.plugin.clone()
    }

    /// Start a heartbeat task that logs sampler status periodically
    fn start_heartbeat(&mut self, state: SharedSamplerState) -> Result<()> {
        debug!("Starting heartbeat monitor");

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                time::sleep(HEARTBEAT_INTERVAL).await;
                let snapshot = state.read().await.clone();
                debug!(
                    "Daemon heartbeat: sampler {:?}, {} cycles ({} failed), readings {:?}",
                    snapshot.phase,
                    snapshot.cycles_completed,
                    snapshot.cycles_failed,
                    snapshot.last_readings
                );
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Stop the auxiliary tasks; the sampler ends with the runtime
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
        for task in &self.tasks {
            task.abort();
        }
    }

    /// Wait for all tasks to complete
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match task.await {
                Ok(result) => result?,
                Err(e) if e.is_cancelled() => {}
                Err(e) => log::error!("Task panicked: {}", e),
            }
        }
        Ok(())
    }
}
