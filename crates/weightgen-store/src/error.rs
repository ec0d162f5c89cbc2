/// Errors raised while reading a weight container or assembling an export set.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The container is missing, unreadable or structurally malformed.
    ///
    /// `location` names the offending group, or the container itself when the failure happens
    /// before any group is visited.
    #[error("Container format error in `{location}`: {reason}")]
    ContainerFormat {
        /// Group, layer or file the error refers to.
        location: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A key remapping pattern is not a valid regular expression.
    #[error("Invalid key remap pattern: {0}")]
    InvalidRemapPattern(#[from] regex::Error),

    /// A layer with the same name is already part of the export set.
    #[error("Duplicate layer `{0}`")]
    DuplicateLayer(String),

    /// Layer names must not be empty.
    #[error("Layer name is empty")]
    EmptyLayerName,
}

impl StoreError {
    pub(crate) fn container_format(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContainerFormat {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
