use super::identifier::Identifier;
use super::outcome::has_prize;
use super::profile::{LookupResult, ProfileGenerator};
use std::future::Future;
use std::time::Duration;

/// The remote step of a lookup. The workflow only sees this seam, so a real registry
/// client can replace the simulation without touching the state machine.
pub trait LookupGateway: Send + Sync + 'static {
    fn consult(
        &self,
        identifier: Identifier,
    ) -> impl Future<Output = Result<LookupResult, GatewayError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("lookup backend unavailable: {0}")]
    Unavailable(String),
}

/// Waits a fixed latency, then derives the result locally.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    latency: Duration,
    generator: ProfileGenerator,
}

impl SimulatedGateway {
    pub fn new(latency: Duration, generator: ProfileGenerator) -> Self {
        Self { latency, generator }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl LookupGateway for SimulatedGateway {
    async fn consult(&self, identifier: Identifier) -> Result<LookupResult, GatewayError> {
        tokio::time::sleep(self.latency).await;
        let prize = has_prize(&identifier);
        Ok(self.generator.lookup_result(&identifier, prize))
    }
}
