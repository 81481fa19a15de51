//! Parser module: Lua doc-comment annotations into the documentation model.

pub mod lua;
pub mod types;

use crate::model::Module;
use std::path::Path;
use thiserror::Error;

/// A malformed annotation. Always fatal for the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{path}:{line}: unknown tag @{tag}")]
    UnknownTag {
        path: String,
        line: usize,
        tag: String,
    },

    #[error("{path}:{line}: @{tag} is missing {what}")]
    MissingOperand {
        path: String,
        line: usize,
        tag: &'static str,
        what: &'static str,
    },

    #[error("{path}:{line}: @field outside of a @class or @enum block")]
    FieldOutsideClass { path: String, line: usize },

    #[error("{path}:{line}: malformed type `{text}`: {reason}")]
    MalformedType {
        path: String,
        line: usize,
        text: String,
        reason: String,
    },

    #[error("{path}: @classmod {name} declares no @class")]
    ClassModWithoutClass { path: String, name: String },
}

/// Parse one annotated source file.
pub fn parse(content: &str, path: &Path) -> Result<Module, ParseError> {
    lua::parse(content, path)
}
