use async_trait::async_trait;

/// Produces the current screen observation.
///
/// Implementations never fail: a capture problem comes back as an
/// `"Error: ..."` observation so the model can react to it.
#[async_trait]
pub trait ScreenSource: Send + Sync {
    async fn capture(&self) -> String;
}
