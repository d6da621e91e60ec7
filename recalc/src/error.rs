use thiserror::Error;

use crate::review::ReviewError;

#[derive(Debug, Error)]
pub enum RecalcError {
    #[error("store error: {0}")]
    Store(#[from] xtdh_store::StoreError),

    #[error("engine error: {0}")]
    Engine(#[from] xtdh_engine::EngineError),

    #[error(transparent)]
    Review(#[from] ReviewError),
}
