//! Error type for `sgc-certificate`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no usable font family {family:?} in {dir}: {source}")]
  Fonts {
    dir:    PathBuf,
    family: String,
    #[source]
    source: genpdf::error::Error,
  },

  #[error("pdf error: {0}")]
  Pdf(#[from] genpdf::error::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
