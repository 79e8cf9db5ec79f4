use std::sync::Arc;

use contracts::{CapabilitiesSnapshot, PersistenceGateway};

/// Runs the persistence gateway's capability probe once at startup and keeps
/// the result around for `GET /api/system/capabilities` and the lifecycle
/// service's degraded-mode flag to agree on.
pub struct CapabilityProbe {
    gateway: Arc<dyn PersistenceGateway>,
}

/// The probe result plus a human-readable reason when something is missing,
/// since `CapabilitiesSnapshot` alone doesn't say *why* it's degraded.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub snapshot: CapabilitiesSnapshot,
    pub degraded_reason: Option<String>,
}

impl CapabilityProbe {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Probes the gateway and classifies the result. A probe failure (the
    /// gateway itself errors rather than returning an all-`false` snapshot)
    /// is treated the same as "nothing configured": this process still
    /// starts, just fully in-memory.
    pub async fn probe(&self) -> ProbeOutcome {
        match self.gateway.probe_capabilities().await {
            Ok(snapshot) => ProbeOutcome {
                degraded_reason: Self::degraded_reason(&snapshot),
                snapshot,
            },
            Err(err) => {
                tracing::warn!(%err, "capability probe failed; continuing fully in-memory");
                ProbeOutcome {
                    snapshot: CapabilitiesSnapshot::default(),
                    degraded_reason: Some(format!("capability probe failed: {err}")),
                }
            }
        }
    }

    fn degraded_reason(snapshot: &CapabilitiesSnapshot) -> Option<String> {
        if !snapshot.configured {
            return Some("no persistence backend configured".to_string());
        }
        if !snapshot.lifecycle_ready {
            return Some("persistence backend lacks the hypothesis-experiment tables".to_string());
        }
        if !snapshot.rehydration_ready {
            return Some("persistence backend lacks embedding/search capability".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::NullGateway;

    #[tokio::test]
    async fn probing_a_null_gateway_reports_degraded_with_a_reason() {
        let probe = CapabilityProbe::new(Arc::new(NullGateway));
        let outcome = probe.probe().await;
        assert!(!outcome.snapshot.configured);
        assert!(outcome.degraded_reason.is_some());
    }
}
