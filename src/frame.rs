use chrono::{DateTime, Utc};
use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the on-screen photograph came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Taken by the capture adapter and loaded from the temporary store
    Camera { path: PathBuf },
    /// Annotated board returned by the score endpoint
    ScoreResult { reference: String },
}

impl ImageSource {
    pub fn label(&self) -> String {
        match self {
            ImageSource::Camera { path } => format!("camera ({})", path.display()),
            ImageSource::ScoreResult { reference } => format!("score result ({})", reference),
        }
    }
}

/// The single photograph held by a session.
///
/// Pixel data is shared behind an `Arc` and never mutated; a new capture or
/// score result replaces the whole value.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pixels: Arc<RgbImage>,
    source: ImageSource,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(pixels: RgbImage, source: ImageSource) -> Self {
        Self {
            pixels: Arc::new(pixels),
            source,
            captured_at: Utc::now(),
        }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// True when both values share the same pixel buffer
    pub fn same_pixels(&self, other: &CapturedImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Age in whole seconds
    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.captured_at).num_seconds().max(0)
    }
}
