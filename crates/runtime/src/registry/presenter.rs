//! UI hook for the aggregate loading indicator.

use crate::error::Result;
use crate::transport::BoxFuture;

/// Shows or hides the loading indicator while any channel is loading.
pub trait LoadingPresenter: Send + Sync {
	fn set_visible(&self, visible: bool) -> BoxFuture<'_, Result<()>>;
}

/// Presenter that only logs. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl LoadingPresenter for LogPresenter {
	fn set_visible(&self, visible: bool) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			tracing::debug!(target: "sdkconn.registry", visible, "loading indicator");
			Ok(())
		})
	}
}
