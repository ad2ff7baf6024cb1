use std::future::Future;

use ha_components::HomeAssistantResult;
use tracing::warn;

use crate::coordinator::PlugwiseCoordinator;

/// Run a gateway command, then refresh the coordinator
///
/// The refresh happens whether or not the command succeeded. Gateway
/// failures reach the caller as `HomeAssistantError::Integration` through
/// the `GatewayError` conversion.
pub async fn run_command<T, F>(
    coordinator: &PlugwiseCoordinator,
    command: F,
) -> HomeAssistantResult<T>
where
    F: Future<Output = HomeAssistantResult<T>>,
{
    let result = command.await;
    if let Err(e) = &result {
        warn!(error = %e, "Plugwise command failed");
    }
    coordinator.request_refresh().await;
    result
}
