//! Holder of the latest gateway snapshot

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::GatewayApi;
use crate::config::PlugwiseConfig;
use crate::data::GatewayData;
use crate::error::GatewayError;

/// What listeners observe after every refresh
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub data: Arc<GatewayData>,
    pub last_update_success: bool,
}

/// Fetches gateway data and notifies entities of new snapshots
pub struct PlugwiseCoordinator {
    api: Arc<dyn GatewayApi>,
    config: Option<PlugwiseConfig>,
    state: watch::Sender<CoordinatorState>,
}

impl PlugwiseCoordinator {
    /// Create a coordinator without data; call [`Self::refresh`] before use
    pub fn new(api: Arc<dyn GatewayApi>, config: Option<PlugwiseConfig>) -> Self {
        let (state, _) = watch::channel(CoordinatorState::default());
        Self { api, config, state }
    }

    /// Create a coordinator and fetch the first snapshot
    pub async fn connect(
        api: Arc<dyn GatewayApi>,
        config: Option<PlugwiseConfig>,
    ) -> Result<Arc<Self>, GatewayError> {
        let coordinator = Arc::new(Self::new(api, config));
        coordinator.refresh().await?;
        info!(
            smile = %coordinator.data().gateway.smile_name,
            devices = coordinator.data().devices.len(),
            "Connected to Smile"
        );
        Ok(coordinator)
    }

    pub fn api(&self) -> Arc<dyn GatewayApi> {
        Arc::clone(&self.api)
    }

    pub fn config(&self) -> Option<&PlugwiseConfig> {
        self.config.as_ref()
    }

    /// The latest snapshot
    pub fn data(&self) -> Arc<GatewayData> {
        Arc::clone(&self.state.borrow().data)
    }

    /// Whether the last refresh succeeded
    pub fn last_update_success(&self) -> bool {
        self.state.borrow().last_update_success
    }

    /// Current data and refresh status
    pub fn snapshot(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    /// Fetch a new snapshot and notify listeners
    ///
    /// On failure the previous data is kept, `last_update_success` drops to
    /// false and listeners are notified as well.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), GatewayError> {
        match self.api.async_update().await {
            Ok(data) => {
                debug!(devices = data.devices.len(), "Fetched gateway data");
                self.state.send_replace(CoordinatorState {
                    data: Arc::new(data),
                    last_update_success: true,
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Error fetching gateway data");
                self.state.send_modify(|state| state.last_update_success = false);
                Err(e)
            }
        }
    }

    /// Refresh, logging instead of returning a failure
    pub async fn request_refresh(&self) {
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "Requested refresh failed");
        }
    }

    /// Receiver notified after every refresh
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }
}
