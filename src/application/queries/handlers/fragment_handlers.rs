//! Fragment Query Handlers

use crate::application::error::ApplicationError;
use crate::application::queries::PreviewFragments;
use crate::domain::{index_fragments, split, Fragment};

/// PreviewFragments Handler
#[derive(Debug, Default)]
pub struct PreviewFragmentsHandler;

impl PreviewFragmentsHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, query: PreviewFragments) -> Result<Vec<Fragment>, ApplicationError> {
        let fragments = index_fragments(split(&query.text, query.max_chars)?);

        tracing::debug!(
            text_len = query.text.chars().count(),
            max_chars = query.max_chars,
            fragments = fragments.len(),
            "Text fragmented"
        );

        Ok(fragments)
    }
}
