use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("store error: {0}")]
    Store(#[from] xtdh_store::StoreError),
}
