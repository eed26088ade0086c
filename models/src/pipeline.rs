use std::borrow::Cow;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Whether a pipeline knows its transformation up front or has to work it out.
///
/// A processor pipeline transforms a specific raw format into a specific
/// processed format, so it may only be assigned to a batch whose
/// `processed_format` is already known. A discovery pipeline's whole job is
/// to determine the formats first, so it carries no such requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Processor,
    Discovery,
}

/// A pipeline identifier tagged with its category.
///
/// Both categories share one namespace of string identifiers; the category
/// tag is what the invariant check tests, never the identifier value. New
/// identifiers can be added without touching any caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    kind: PipelineKind,
    name: Cow<'static, str>,
}

impl Pipeline {
    pub const fn processor(name: &'static str) -> Self {
        Self {
            kind: PipelineKind::Processor,
            name: Cow::Borrowed(name),
        }
    }

    pub const fn discovery(name: &'static str) -> Self {
        Self {
            kind: PipelineKind::Discovery,
            name: Cow::Borrowed(name),
        }
    }

    pub fn new(kind: PipelineKind, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_discovery(&self) -> bool {
        self.kind == PipelineKind::Discovery
    }
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Transforms microarray intensity data into a normalized expression matrix.
pub const MICRO_ARRAY_TO_PCL: Pipeline = Pipeline::processor("MICRO_ARRAY_TO_PCL");

/// Determines the raw and processed formats of a batch before any
/// transformation can be picked for it.
pub const FORMAT_DETECTION: Pipeline = Pipeline::discovery("FORMAT_DETECTION");
