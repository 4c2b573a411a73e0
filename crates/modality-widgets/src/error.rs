#![forbid(unsafe_code)]

//! Errors from modal construction and registry initialisation.

use modality_core::{NodeId, SelectorError};

/// Errors from modal operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    /// The target element has no (or an empty) `id` attribute.
    InvalidModalTarget { node: NodeId },
    /// The selector passed to the registry did not parse.
    Selector(SelectorError),
}

impl std::fmt::Display for ModalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidModalTarget { node } => write!(
                f,
                "modal target element #{} has no id attribute",
                node.index()
            ),
            Self::Selector(err) => write!(f, "invalid modal selector: {err}"),
        }
    }
}

impl std::error::Error for ModalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Selector(err) => Some(err),
            Self::InvalidModalTarget { .. } => None,
        }
    }
}

impl From<SelectorError> for ModalError {
    fn from(err: SelectorError) -> Self {
        Self::Selector(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modality_core::{Document, SelectorList};
    use std::error::Error as _;

    #[test]
    fn selector_errors_convert_and_chain() {
        let err: ModalError = SelectorList::parse("[href").unwrap_err().into();
        assert!(matches!(err, ModalError::Selector(SelectorError::UnterminatedAttribute { .. })));
        assert!(err.to_string().starts_with("invalid modal selector: "));
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_target_display() {
        let doc = Document::new();
        let node = doc.create_element("div");
        let err = ModalError::InvalidModalTarget { node };
        assert_eq!(
            err.to_string(),
            format!("modal target element #{} has no id attribute", node.index())
        );
        assert!(err.source().is_none());
    }
}
