//! Decoded image handles and loaders

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;
use thiserror::Error;

use crate::fetch::{CancelToken, Fetcher};

/// Bytes per decoded pixel (RGBA).
const BYTES_PER_PIXEL: f64 = 4.0;

/// Allowance for decoder and allocator overhead on top of raw pixels.
const SIZE_OVERHEAD: f64 = 1.2;

/// A decoded image, cheap to clone.
#[derive(Clone)]
pub struct ImageHandle {
    image: Arc<DynamicImage>,
}

impl ImageHandle {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Decode an encoded image (PNG, JPEG, WebP, ...) from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        image::load_from_memory(bytes).map(Self::new)
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Estimated resident size: `width * height * 4 * 1.2`, rounded.
    pub fn approx_byte_size(&self) -> u64 {
        approx_byte_size(self.width(), self.height())
    }

    /// Whether two handles refer to the same decoded image.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Size estimate for an image with the given natural dimensions.
pub fn approx_byte_size(width: u32, height: u32) -> u64 {
    let pixels = width as f64 * height as f64;
    (pixels * BYTES_PER_PIXEL * SIZE_OVERHEAD).round() as u64
}

/// A single URL could not be fetched or decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to load image: {url} ({reason})")]
pub struct ImageLoadError {
    pub url: String,
    pub reason: String,
}

impl ImageLoadError {
    pub fn new(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Loads and decodes the image behind a URL.
pub trait ImageLoader: Send + Sync {
    fn load(&self, url: &str) -> Result<ImageHandle, ImageLoadError>;
}

/// [`ImageLoader`] that fetches bytes through a [`Fetcher`] and decodes them.
pub struct FetchingImageLoader<F> {
    fetcher: F,
}

impl<F: Fetcher> FetchingImageLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetcher> ImageLoader for FetchingImageLoader<F> {
    fn load(&self, url: &str) -> Result<ImageHandle, ImageLoadError> {
        let bytes = self
            .fetcher
            .fetch(url, &CancelToken::new())
            .map_err(|e| ImageLoadError::new(url, e))?;
        ImageHandle::decode(&bytes).map_err(|e| ImageLoadError::new(url, e))
    }
}
