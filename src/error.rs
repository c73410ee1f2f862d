use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed token data on line {line}: {message}")]
    TokenParse { line: usize, message: String },
    #[error("font file not found at `{}`", .0.display())]
    FontNotFound(PathBuf),
    #[error("failed to parse font: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn read_file(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
