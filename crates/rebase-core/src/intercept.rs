use anyhow::Result;
use async_trait::async_trait;

/// Test seam fired after commit replay completes and before the final
/// compare-and-swap re-read of the head reference. It exists so tests can
/// simulate a concurrent push losing the race; production callers leave it
/// unset and the re-read happens immediately.
#[async_trait]
pub trait SwapIntercept: Send + Sync {
  async fn before_swap(&self) -> Result<()>;
}

/// A no-op implementation for when no intercept is needed
pub struct NoOpIntercept;

#[async_trait]
impl SwapIntercept for NoOpIntercept {
  async fn before_swap(&self) -> Result<()> {
    Ok(())
  }
}
