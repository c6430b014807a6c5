use thiserror::Error;

/// Failures reported by the editing core. None of them leave a document
/// partially mutated: every operation validates before it snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("node `{0}` does not exist in the active document")]
    NodeNotFound(String),
    #[error("edge `{0}` does not exist in the active document")]
    EdgeNotFound(String),
    #[error("document `{0}` does not exist")]
    DocumentNotFound(String),
    #[error("no document is active")]
    NoActiveDocument,
    #[error("cannot connect node `{0}` to itself")]
    SelfLoop(String),
    #[error("node `{node}` already opens document `{document}`")]
    PortalExists { node: String, document: String },
    #[error("invalid import: {0}")]
    InvalidImport(String),
    #[error("failed to encode graph: {0}")]
    Encode(String),
}

impl EditError {
    /// True for the "id absent from current state" class of failures.
    pub fn is_reference_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_)
                | Self::EdgeNotFound(_)
                | Self::DocumentNotFound(_)
                | Self::NoActiveDocument
        )
    }
}

pub type EditResult<T> = Result<T, EditError>;
