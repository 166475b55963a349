use super::gateway::{LookupGateway, SimulatedGateway};
use super::profile::{Campaign, ProfileGenerator, ReferenceData, ReferenceDataError};
use super::workflow::{LookupWorkflow, WorkflowHandle, WorkflowSettings};
use crate::config::LookupConfig;
use std::sync::Arc;
use tracing::info;

/// Factory for per-session workflows sharing one gateway.
pub struct LookupService<G> {
    gateway: Arc<G>,
    settings: WorkflowSettings,
}

impl<G> Clone for LookupService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            settings: self.settings,
        }
    }
}

impl<G: LookupGateway> LookupService<G> {
    pub fn new(gateway: Arc<G>, settings: WorkflowSettings) -> Self {
        Self { gateway, settings }
    }

    /// Starts a fresh workflow in `Idle`. Must be called inside a tokio runtime.
    pub fn session(&self) -> WorkflowHandle {
        LookupWorkflow::spawn(Arc::clone(&self.gateway), self.settings)
    }

    pub fn settings(&self) -> WorkflowSettings {
        self.settings
    }
}

impl LookupService<SimulatedGateway> {
    /// Builds the simulated service, loading reference lists from disk when configured.
    pub fn simulated(config: &LookupConfig) -> Result<Self, ReferenceDataError> {
        let reference = match &config.reference_data {
            Some(path) => {
                let reference = ReferenceData::from_path(path)?;
                info!(path = %path.display(), "loaded reference data override");
                reference
            }
            None => ReferenceData::standard(),
        };
        let generator = ProfileGenerator::new(reference, Campaign::standard());
        let gateway = SimulatedGateway::new(config.latency, generator);
        Ok(Self::new(Arc::new(gateway), WorkflowSettings::from(config)))
    }
}
