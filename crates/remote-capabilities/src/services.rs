//! Service traits implemented by backend adapters.

use crate::{CounterAction, EventKind, RemoteResult, RemoteSession, User};
use async_trait::async_trait;

/// Remote authentication service.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<User>;

    /// Create an account; `metadata` is forwarded untouched.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> RemoteResult<User>;

    async fn sign_out(&self) -> RemoteResult<()>;

    /// Existing valid session, if any.
    async fn get_session(&self) -> RemoteResult<Option<RemoteSession>>;
}

/// Server-side favourite counters.
#[async_trait]
pub trait CounterService: Send + Sync {
    async fn invoke_counter_mutation(
        &self,
        entity_id: &str,
        action: CounterAction,
    ) -> RemoteResult<()>;
}

/// Fire-and-forget event sink.
///
/// Implementations must not block and must swallow their own failures.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, entity_id: &str, kind: EventKind);
}

/// Telemetry sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _entity_id: &str, _kind: EventKind) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RemoteError;
    use std::sync::Arc;

    struct AlwaysDown;

    #[async_trait]
    impl CounterService for AlwaysDown {
        async fn invoke_counter_mutation(
            &self,
            _entity_id: &str,
            _action: CounterAction,
        ) -> RemoteResult<()> {
            Err(RemoteError::Unavailable("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_counter_service_is_object_safe() {
        let service: Arc<dyn CounterService> = Arc::new(AlwaysDown);
        let result = service
            .invoke_counter_mutation("c1", CounterAction::Increment)
            .await;
        assert!(matches!(result, Err(RemoteError::Unavailable(_))));
    }

    #[test]
    fn test_noop_telemetry_accepts_events() {
        let sink: Arc<dyn TelemetrySink> = Arc::new(NoopTelemetry);
        sink.record("c1", EventKind::Click);
    }
}
