use crate::wg::config::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("wg cmd fail: {0:?}: {1}")]
    WgCommandFail(Option<i32>, String),
}
