use serde::{Deserialize, Serialize};

use common::reference::DatasetRef;

use super::{default_limit, materialize, resolve, Dispatch, RequestError};

pub const LOG: &str = "History.Log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogParams {
    pub reference: DatasetRef,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl LogParams {
    pub fn new(reference: DatasetRef) -> Self {
        Self {
            reference,
            offset: 0,
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryRequests {
    dispatch: Dispatch,
}

impl HistoryRequests {
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Versions of a dataset, newest first, following `previous` links
    pub async fn log(&self, params: &LogParams) -> Result<Vec<DatasetRef>, RequestError> {
        self.dispatch
            .run(LOG, params, |node| async move {
                let mut head = params.reference.without_dataset();
                resolve(&node, &mut head).await?;
                let mut next = Some(materialize(&node, &head).await?);

                let repo = node.repo();
                let mut versions = Vec::new();
                let mut skipped = 0;
                while let Some(path) = next.take() {
                    if versions.len() >= params.limit {
                        break;
                    }
                    let dataset = repo.load_dataset(&path).await?;
                    next = dataset.previous;
                    if skipped < params.offset {
                        skipped += 1;
                        continue;
                    }
                    versions.push(DatasetRef {
                        path: Some(path),
                        dataset: Some(dataset),
                        ..head.clone()
                    });
                }
                Ok(versions)
            })
            .await
    }
}
