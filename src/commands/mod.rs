// Reconciliation
pub mod apply;

// Inspection
pub mod describe;
pub mod validate;

use anyhow::Result;
use declarative::ClusterAdmin;
use std::time::Duration;

use crate::config::ClientSettings;

/// Open an admin connection to the cluster
#[cfg(feature = "kafka")]
pub fn connect(settings: &ClientSettings, timeout: Duration) -> Result<Box<dyn ClusterAdmin>> {
    log::debug!(
        "Connecting to {} with {} client properties",
        settings.get(crate::config::BOOTSTRAP_SERVERS).unwrap_or_default(),
        settings.iter().count()
    );
    Ok(Box::new(crate::kafka::KafkaAdmin::connect(settings, timeout)?))
}

/// Open an admin connection to the cluster
#[cfg(not(feature = "kafka"))]
pub fn connect(_settings: &ClientSettings, _timeout: Duration) -> Result<Box<dyn ClusterAdmin>> {
    anyhow::bail!("ktc was built without Kafka support, rebuild with `--features kafka`")
}
