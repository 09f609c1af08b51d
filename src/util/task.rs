use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panicking background fetch would otherwise vanish inside the runtime and
/// leave whoever waits on it stuck. With this wrapper the caller gets
/// `Err(panic_message)` and can record the failure.
///
/// # Example
///
/// ```ignore
/// tokio::spawn(async move {
///     match catch_task_panic(source.fetch(window)).await {
///         Ok(result) => apply(result),
///         Err(panic_msg) => tracing::error!(error = %panic_msg, "Fetch task panicked"),
///     }
/// });
/// ```
pub async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic payload".to_string()
            }
        })
}
