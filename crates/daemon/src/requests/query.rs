use common::reference::DatasetRef;

use super::{materialize, page, refs_for, resolve, Dispatch, ListParams, RequestError};

pub const LIST: &str = "Query.List";
pub const GET: &str = "Query.Get";

/// Datasets that were produced by a query
#[derive(Debug, Clone)]
pub struct QueryRequests {
    dispatch: Dispatch,
}

impl QueryRequests {
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Query outputs in the local repository, filtered like `Dataset.List`
    pub async fn list(&self, params: &ListParams) -> Result<Vec<DatasetRef>, RequestError> {
        self.dispatch
            .run(LIST, params, |node| async move {
                let repo = node.repo();
                let mut queries = Vec::new();
                for mut r in refs_for(&node, params.peername.as_deref()) {
                    let Some(path) = r.path else { continue };
                    let Ok(dataset) = repo.load_dataset(&path).await else {
                        continue;
                    };
                    if dataset.query.is_some() {
                        r.dataset = Some(dataset);
                        queries.push(r);
                    }
                }
                Ok(page(queries, params.offset, params.limit))
            })
            .await
    }

    pub async fn get(&self, reference: &DatasetRef) -> Result<DatasetRef, RequestError> {
        self.dispatch
            .run(GET, reference, |node| async move {
                let mut r = reference.without_dataset();
                resolve(&node, &mut r).await?;
                let path = materialize(&node, &r).await?;
                let dataset = node.repo().load_dataset(&path).await?;
                if dataset.query.is_none() {
                    return Err(RequestError::NotFound(format!(
                        "{} was not produced by a query",
                        r
                    )));
                }
                r.dataset = Some(dataset);
                Ok(r)
            })
            .await
    }
}
