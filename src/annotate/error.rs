use crate::feature::IonMode;
use crate::model::ModelError;
use crate::reference::ReferenceStoreError;

/// Row-level annotation failures.
///
/// These never abort a batch: the pipeline attaches them to the failing
/// feature's output row and carries on with the others.
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    /// Adduct token not in the adduct table for the feature's ion mode
    #[error("unknown adduct '{adduct}' for {ion_mode} mode")]
    UnknownAdduct {
        /// Token as provided or predicted
        adduct: String,
        /// Feature polarity
        ion_mode: IonMode,
    },

    /// Class label not in the class table
    #[error("unknown lipid class '{0}'")]
    UnknownClass(String),

    /// Reference store query failed
    #[error(transparent)]
    Store(#[from] ReferenceStoreError),

    /// A model failed for this feature
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AnnotationError {
    /// Short error kind label for reports
    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationError::UnknownAdduct { .. } => "unknown_adduct",
            AnnotationError::UnknownClass(_) => "unknown_class",
            AnnotationError::Store(_) => "reference_store",
            AnnotationError::Model(_) => "model",
        }
    }
}
