//! Generation request body, field validation and the job descriptor.

use image::Rgb;
use qr_engine::{DEFAULT_BOX_SIZE, Palette};
use reqwest::Url;
use serde::Deserialize;

/// Body of `POST /generate-qr/`.
///
/// Numeric fields are deserialized wide so out-of-range values reach
/// [`QrRequest::validate`] and get a per-field message.
#[derive(Debug, Clone, Deserialize)]
pub struct QrRequest {
    pub text: String,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub color: Option<ColorInput>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ColorInput {
    pub red: i64,
    pub green: i64,
    pub blue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("size must be between 1 and {max} (got {got})")]
    SizeOutOfRange { got: i64, max: u32 },

    #[error("color.{channel} must be between 0 and 255 (got {got})")]
    ChannelOutOfRange { channel: &'static str, got: i64 },

    #[error("logo_url must be an absolute http(s) URL")]
    InvalidLogoUrl,
}

/// What the pipeline has to do, decided once from the optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrJob {
    Plain,
    Colored(Rgb<u8>),
    Logoed(Url),
    ColoredLogoed(Rgb<u8>, Url),
}

impl QrJob {
    pub fn new(color: Option<Rgb<u8>>, logo_url: Option<Url>) -> Self {
        match (color, logo_url) {
            (None, None) => Self::Plain,
            (Some(c), None) => Self::Colored(c),
            (None, Some(u)) => Self::Logoed(u),
            (Some(c), Some(u)) => Self::ColoredLogoed(c, u),
        }
    }

    pub fn has_color(&self) -> bool {
        matches!(self, Self::Colored(_) | Self::ColoredLogoed(..))
    }

    pub fn has_logo(&self) -> bool {
        matches!(self, Self::Logoed(_) | Self::ColoredLogoed(..))
    }

    pub fn palette(&self) -> Palette {
        match self {
            Self::Colored(c) | Self::ColoredLogoed(c, _) => Palette::with_foreground(*c),
            Self::Plain | Self::Logoed(_) => Palette::default(),
        }
    }

    pub fn logo_url(&self) -> Option<&Url> {
        match self {
            Self::Logoed(u) | Self::ColoredLogoed(_, u) => Some(u),
            Self::Plain | Self::Colored(_) => None,
        }
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSpec {
    pub text: String,
    pub box_size: u32,
    pub job: QrJob,
}

impl QrRequest {
    pub fn validate(self, max_box_size: u32) -> Result<QrSpec, ValidationError> {
        if self.text.is_empty() {
            return Err(ValidationError::EmptyText);
        }

        let box_size = match self.size {
            None => DEFAULT_BOX_SIZE,
            Some(got) if (1..=i64::from(max_box_size)).contains(&got) => got as u32,
            Some(got) => {
                return Err(ValidationError::SizeOutOfRange {
                    got,
                    max: max_box_size,
                });
            }
        };

        let color = self.color.map(ColorInput::to_rgb).transpose()?;
        let logo_url = self.logo_url.as_deref().map(parse_logo_url).transpose()?;

        Ok(QrSpec {
            text: self.text,
            box_size,
            job: QrJob::new(color, logo_url),
        })
    }
}

impl ColorInput {
    fn to_rgb(self) -> Result<Rgb<u8>, ValidationError> {
        let channel = |name: &'static str, got: i64| {
            u8::try_from(got).map_err(|_| ValidationError::ChannelOutOfRange { channel: name, got })
        };
        Ok(Rgb([
            channel("red", self.red)?,
            channel("green", self.green)?,
            channel("blue", self.blue)?,
        ]))
    }
}

fn parse_logo_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|_| ValidationError::InvalidLogoUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ValidationError::InvalidLogoUrl),
    }
}
