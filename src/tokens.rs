//! OCR token sources.
//!
//! The classifier never runs OCR itself. It is handed tokens by a
//! [`TokenSource`], which must return them in a stable scan order.

use std::path::Path;

use image::DynamicImage;
use tracing::instrument;

use crate::{
    error::{read_file, Error, Result},
    BoundingBox, Token,
};

/// Tesseract's row level for single words.
const WORD_LEVEL: u32 = 5;

pub trait TokenSource {
    /// Recognized words in left-to-right, top-to-bottom order.
    fn tokens(&self, image: &DynamicImage) -> Result<Vec<Token>>;
}

/// Tokens read from Tesseract's `image_to_data` TSV output.
#[derive(Debug, Clone, Default)]
pub struct TsvTokens {
    tokens: Vec<Token>,
}

impl TsvTokens {
    #[instrument(level = "debug")]
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = read_file(path)?;
        Self::parse(&String::from_utf8_lossy(&bytes))
    }

    /// Parses the TSV, keeping only word rows with visible text and a
    /// non-empty box. Column order is taken from the header row.
    pub fn parse(source: &str) -> Result<Self> {
        let mut lines = source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());
        let Some((_, header)) = lines.next() else {
            return Ok(Self::default());
        };
        let columns = Columns::from_header(header)?;

        let mut tokens = Vec::new();
        for (index, line) in lines {
            let line_number = index + 1;
            let fields = line.split('\t').collect::<Vec<_>>();
            if let Some(token) = columns.token(&fields, line_number)? {
                tokens.push(token);
            }
        }
        log::debug!("Read {} tokens", tokens.len());
        Ok(Self { tokens })
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_inner(self) -> Vec<Token> {
        self.tokens
    }
}

impl TokenSource for TsvTokens {
    fn tokens(&self, _image: &DynamicImage) -> Result<Vec<Token>> {
        Ok(self.tokens.clone())
    }
}

struct Columns {
    level: Option<usize>,
    left: usize,
    top: usize,
    width: usize,
    height: usize,
    conf: usize,
    text: usize,
}

impl Columns {
    fn from_header(header: &str) -> Result<Self> {
        let names = header.split('\t').map(str::trim).collect::<Vec<_>>();
        let find = |name: &str| names.iter().position(|it| *it == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::TokenParse {
                line: 1,
                message: format!("missing `{name}` column"),
            })
        };
        Ok(Self {
            level: find("level"),
            left: require("left")?,
            top: require("top")?,
            width: require("width")?,
            height: require("height")?,
            conf: require("conf")?,
            text: require("text")?,
        })
    }

    fn token(&self, fields: &[&str], line: usize) -> Result<Option<Token>> {
        if let Some(level) = self.level {
            if parse_field::<u32>(fields, level, "level", line)? != WORD_LEVEL {
                return Ok(None);
            }
        }
        let ocr_confidence = parse_field::<f32>(fields, self.conf, "conf", line)?;
        // Tesseract writes -1 for structural rows without recognized text.
        if ocr_confidence < 0.0 {
            return Ok(None);
        }
        let text = fields.get(self.text).map(|it| it.trim()).unwrap_or_default();
        if text.is_empty() {
            return Ok(None);
        }
        let bounding_box = BoundingBox::new(
            parse_field(fields, self.left, "left", line)?,
            parse_field(fields, self.top, "top", line)?,
            parse_field(fields, self.width, "width", line)?,
            parse_field(fields, self.height, "height", line)?,
        );
        if bounding_box.is_empty() {
            return Ok(None);
        }
        Ok(Some(Token::new(text, bounding_box, ocr_confidence)))
    }
}

fn parse_field<T: std::str::FromStr>(
    fields: &[&str],
    index: usize,
    name: &str,
    line: usize,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = fields.get(index).ok_or_else(|| Error::TokenParse {
        line,
        message: format!("missing `{name}` field"),
    })?;
    raw.trim().parse().map_err(|err| Error::TokenParse {
        line,
        message: format!("invalid `{name}` value {raw:?}: {err}"),
    })
}
