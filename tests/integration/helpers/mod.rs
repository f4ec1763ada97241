//! Test helper utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use image::{DynamicImage, ImageFormat, RgbaImage};

use flipcache::fetch::{CancelToken, FetchError, Fetcher};
use flipcache::metadata::{Hotspot, PageRecord};
use flipcache::ImageHandle;

/// Encode a blank RGBA image as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::new(width, height))
        .write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode PNG");
    buf.into_inner()
}

/// A decoded image handle of the given dimensions.
pub fn image(width: u32, height: u32) -> ImageHandle {
    ImageHandle::new(DynamicImage::ImageRgba8(RgbaImage::new(width, height)))
}

/// Pages `1..=count` with image URLs under `https://cdn.test/{catalog}/`.
pub fn pages(catalog: &str, count: u32) -> Vec<PageRecord> {
    (1..=count)
        .map(|n| PageRecord {
            id: Some(format!("{}-p{}", catalog, n)),
            page_number: n,
            image_url: page_url(catalog, n),
        })
        .collect()
}

pub fn page_url(catalog: &str, page: u32) -> String {
    format!("https://cdn.test/{}/page-{}.png", catalog, page)
}

pub fn hotspot(id: &str, page: u32, rect: (f64, f64, f64, f64)) -> Hotspot {
    Hotspot {
        id: id.to_string(),
        page_number: page,
        x: rect.0,
        y: rect.1,
        width: rect.2,
        height: rect.3,
        product_sku: None,
        link_url: None,
        label: None,
        z_index: 0,
    }
}

/// Serves fixed bodies from memory and records every request.
#[derive(Default)]
pub struct MapFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
    count: AtomicUsize,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    /// Serve a small PNG for every URL given.
    pub fn with_pngs<'a>(mut self, urls: impl IntoIterator<Item = &'a String>) -> Self {
        for url in urls {
            self.bodies.insert(url.clone(), png_bytes(4, 4));
        }
        self
    }

    pub fn request_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for MapFetcher {
    fn fetch(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        cancel.check()?;
        self.count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies.get(url).cloned().ok_or(FetchError::Http {
            status: 404,
            reason: "Not Found".to_string(),
        })
    }
}
