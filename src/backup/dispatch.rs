use futures::stream::{self, StreamExt};
use std::path::Path;
use tracing::{error, info};

use crate::adapters::Storage;
use crate::errors::StorageTransferError;
use crate::utils::Toolbox;

/// Hands `artifact` to every storage, at most `concurrency` at a time.
///
/// Storages are started in registration order and every one of them is
/// attempted; the failures are returned in that same order.
pub async fn dispatch(
    storages: &[Box<dyn Storage>],
    artifact: &Path,
    toolbox: &Toolbox,
    concurrency: usize,
) -> Vec<StorageTransferError> {
    let outcomes = stream::iter(storages)
        .map(|storage| async move {
            info!(storage = storage.name(), artifact = %artifact.display(), "transferring artifact");
            let outcome = storage.transfer(artifact, toolbox).await;
            (storage.name().to_string(), outcome)
        })
        .buffered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    outcomes
        .into_iter()
        .filter_map(|(storage, outcome)| match outcome {
            Ok(()) => {
                info!(storage = %storage, "transfer complete");
                None
            }
            Err(e) => {
                error!(storage = %storage, error = %e, "transfer failed");
                Some(StorageTransferError {
                    storage,
                    path: artifact.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        })
        .collect()
}
