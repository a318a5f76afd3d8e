use crate::backend::ModelBackend;
use crate::prompt::AnnotationTask;
use crate::types::Result;
use futures::future::try_join_all;
use tracing::debug;

/// Send every input of one chunk to the backend concurrently and return
/// the raw response texts positionally aligned to `inputs`.
///
/// Requests may complete in any order; `try_join_all` restores input order
/// before returning, so callers can zip the result with their candidate
/// list. Responses are returned raw; normalization is the orchestrator's
/// job. Any individual failure fails the whole chunk: there are no
/// partial-success semantics inside a chunk.
pub async fn dispatch_batch(
    task: &AnnotationTask,
    backend: &dyn ModelBackend,
    inputs: &[String],
) -> Result<Vec<String>> {
    debug!(
        "Dispatching {} concurrent requests to {}",
        inputs.len(),
        backend.backend_name()
    );

    let requests = inputs.iter().map(|input| {
        let messages = task.render(input);
        async move {
            let response = backend.complete(&messages).await?;
            Ok(response.text)
        }
    });

    try_join_all(requests).await
}
