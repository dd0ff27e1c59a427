//! GenerationGate - entitlement check in front of paid generation.

use crate::application::handlers::billing::EntitlementResolver;
use crate::domain::billing::Entitlement;
use crate::domain::foundation::Timestamp;
use crate::ports::GenerationError;

#[derive(Clone)]
pub struct GenerationGate {
    resolver: EntitlementResolver,
}

impl GenerationGate {
    pub fn new(resolver: EntitlementResolver) -> Self {
        Self { resolver }
    }

    /// Admits the caller only while their entitlement is active.
    pub async fn check(&self, email: &str) -> Result<Entitlement, GenerationError> {
        let entitlement = self.resolver.resolve(email, Timestamp::now()).await;
        if entitlement.active {
            Ok(entitlement)
        } else {
            tracing::info!(customer_email = %entitlement.customer_email, "Generation refused: not entitled");
            Err(GenerationError::NotEntitled)
        }
    }
}
