//! QR generation pipeline.
//!
//! `Validating → Encoding → Rendering → [FetchingLogo → CompositingLogo] → Serializing → Done`.
//! Any failure aborts the run and drops the partial image; the stage it
//! failed in is reported by [`PipelineError::failed_at`]. CPU-bound stages run
//! on the blocking pool.

use std::time::{Duration, Instant};

use analytics_db::NewRequest;
use image::DynamicImage;
use qr_engine::QrError;
use tokio::task::{self, JoinError};
use tracing::debug;

use super::logo::{LogoError, LogoFetcher, decode_logo};
use super::request::{QrJob, QrRequest, QrSpec, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Encoding,
    Rendering,
    FetchingLogo,
    CompositingLogo,
    Serializing,
    Done,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Encoding(#[source] QrError),

    #[error("Rendering failed: {0}")]
    Rendering(#[source] QrError),

    #[error(transparent)]
    Logo(#[from] LogoError),

    #[error("PNG serialization failed: {0}")]
    Serializing(#[source] QrError),

    #[error("Pipeline worker failed: {0}")]
    Worker(#[from] JoinError),
}

impl PipelineError {
    /// Stage the pipeline was in when it aborted.
    pub fn failed_at(&self) -> Stage {
        match self {
            Self::Validation(_) => Stage::Validating,
            Self::Encoding(_) => Stage::Encoding,
            Self::Rendering(_) | Self::Worker(_) => Stage::Rendering,
            Self::Logo(LogoError::Decode(_)) => Stage::CompositingLogo,
            Self::Logo(_) => Stage::FetchingLogo,
            Self::Serializing(_) => Stage::Serializing,
        }
    }

    /// HTTP status for the failure: 422 for invalid fields, 400 when the
    /// text or logo cannot be used, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 422,
            Self::Encoding(_) | Self::Logo(_) => 400,
            Self::Rendering(_) | Self::Serializing(_) | Self::Worker(_) => 500,
        }
    }

    /// Status returned by the logo host, if that is what failed.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Logo(e) => e.upstream_status(),
            _ => None,
        }
    }
}

/// Finished PNG plus what the analytics recorder needs to know about it.
#[derive(Debug, Clone)]
pub struct GeneratedQr {
    pub png: Vec<u8>,
    pub width: u32,
    pub box_size: u32,
    pub has_color: bool,
    pub has_logo: bool,
    /// Wall-clock time from the start of validation until the PNG was ready.
    pub elapsed: Duration,
}

impl GeneratedQr {
    pub fn elapsed_ms(&self) -> i64 {
        i64::try_from(self.elapsed.as_millis()).unwrap_or(i64::MAX)
    }

    /// Analytics row describing this generation.
    pub fn record(&self) -> NewRequest {
        NewRequest {
            has_color: self.has_color,
            has_logo: self.has_logo,
            size: i64::from(self.box_size),
            response_time_ms: self.elapsed_ms(),
        }
    }
}

#[derive(Clone)]
pub struct QrPipeline {
    logo: LogoFetcher,
    max_box_size: u32,
}

impl QrPipeline {
    pub fn new(logo: LogoFetcher, max_box_size: u32) -> Self {
        Self { logo, max_box_size }
    }

    pub async fn run(&self, request: QrRequest) -> Result<GeneratedQr, PipelineError> {
        let started = Instant::now();

        enter(Stage::Validating);
        let QrSpec {
            text,
            box_size,
            job,
        } = request.validate(self.max_box_size)?;
        let (has_color, has_logo) = (job.has_color(), job.has_logo());
        let logo_url = job.logo_url().cloned();

        let base = task::spawn_blocking(move || render_base(&text, box_size, &job)).await??;

        let image = match logo_url {
            None => base,
            Some(url) => {
                enter(Stage::FetchingLogo);
                let bytes = self.logo.fetch_bytes(&url).await?;
                task::spawn_blocking(move || composite(base, &bytes)).await??
            }
        };

        enter(Stage::Serializing);
        let width = image.width();
        let png = task::spawn_blocking(move || {
            qr_engine::encode_png(&image).map_err(PipelineError::Serializing)
        })
        .await??;

        let elapsed = started.elapsed();
        enter(Stage::Done);
        Ok(GeneratedQr {
            png,
            width,
            box_size,
            has_color,
            has_logo,
            elapsed,
        })
    }
}

fn enter(stage: Stage) {
    debug!(?stage, "QR pipeline stage");
}

/// Encode and paint the symbol in the color mode the job calls for:
/// grayscale when plain, RGB when colored, RGBA whenever a logo follows.
fn render_base(text: &str, box_size: u32, job: &QrJob) -> Result<DynamicImage, PipelineError> {
    enter(Stage::Encoding);
    let matrix = qr_engine::encode(text).map_err(PipelineError::Encoding)?;

    enter(Stage::Rendering);
    let palette = job.palette();
    let image = match job {
        QrJob::Plain => qr_engine::render_gray(&matrix, box_size).map(DynamicImage::ImageLuma8),
        QrJob::Colored(_) => {
            qr_engine::render_rgb(&matrix, box_size, palette).map(DynamicImage::ImageRgb8)
        }
        QrJob::Logoed(_) | QrJob::ColoredLogoed(..) => {
            qr_engine::render_rgba(&matrix, box_size, palette).map(DynamicImage::ImageRgba8)
        }
    };
    image.map_err(PipelineError::Rendering)
}

fn composite(base: DynamicImage, logo_bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    enter(Stage::CompositingLogo);
    let logo = decode_logo(logo_bytes)?;
    let mut canvas = base.into_rgba8();
    qr_engine::apply_logo(&mut canvas, &logo);
    Ok(DynamicImage::ImageRgba8(canvas))
}
