//! Crate-wide error type
//!
//! Each stage has its own error enum; `Error` unifies them for callers that
//! drive the whole pipeline through `BlockEngine`.

use crate::compiler::CompileError;
use crate::config::ConfigError;
use crate::core::schema::SchemaError;
use crate::runtime::RenderError;
use crate::store::{DocumentError, LoadError, TreeInvariantError};
use crate::transform::property::TransformError;
use crate::update::UpdateError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Tree(#[from] TreeInvariantError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
