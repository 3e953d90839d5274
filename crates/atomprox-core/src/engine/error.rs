use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::ids::ModelId;
use crate::core::models::model_set::ModelError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Model data error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Invalid search configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Atom {0} does not exist in the model set")]
    AtomNotFound(usize),

    #[error("{0} does not exist in the model set")]
    ModelNotFound(ModelId),
}
