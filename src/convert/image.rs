//! Image loading for `<img>` elements
//!
//! Sources are either `https://` URLs, fetched through an [`ImageFetcher`],
//! or inline `data:` URLs. Images larger than the configured box are
//! downscaled to fit it with the aspect ratio kept; smaller ones are left
//! alone. Failures never abort a conversion, they become an
//! [`ImageError`] rendered as text in place of the picture.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};
use log::debug;
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;

/// Why an image could not be embedded
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
pub enum ImageError {
    #[error("could not fetch {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("could not decode image: {reason}")]
    Decode { reason: String },

    #[error("image has no usable source")]
    MissingSource,
}

impl ImageError {
    /// Text shown in the document instead of the image
    pub fn message(&self) -> String {
        match self {
            ImageError::Network { url, .. } => format!("Image not available, {url}"),
            ImageError::Decode { .. } => "Image not available".to_string(),
            ImageError::MissingSource => "Image url not found".to_string(),
        }
    }
}

/// An encoded image scaled to fit the configured box
#[derive(Debug, Clone, Serialize)]
pub struct FittedImage {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Source of remote image bytes
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String>;
}

/// Fetcher that refuses every request; conversions stay offline
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

impl ImageFetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        Err(format!("network access disabled for {url}"))
    }
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use super::ImageFetcher;
    use std::io::Read;
    use std::time::Duration;

    /// Blocking HTTPS fetcher with a per-request timeout
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        timeout: Duration,
        max_bytes: u64,
    }

    impl HttpFetcher {
        pub fn new(timeout: Duration) -> Self {
            Self {
                timeout,
                max_bytes: 20 * 1024 * 1024,
            }
        }
    }

    impl Default for HttpFetcher {
        fn default() -> Self {
            Self::new(Duration::from_secs(10))
        }
    }

    impl ImageFetcher for HttpFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
            let client = reqwest::blocking::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|err| err.to_string())?;
            let response = client
                .get(url)
                .send()
                .and_then(|response| response.error_for_status())
                .map_err(|err| err.to_string())?;

            let mut bytes = Vec::new();
            response
                .take(self.max_bytes)
                .read_to_end(&mut bytes)
                .map_err(|err| err.to_string())?;
            Ok(bytes)
        }
    }
}

/// Load, fit and re-encode the image behind `src`
pub fn load_image(
    src: &str,
    fetcher: &dyn ImageFetcher,
    max_width: u32,
    max_height: u32,
) -> Result<FittedImage, ImageError> {
    let src = src.trim();
    if src.is_empty() {
        return Err(ImageError::MissingSource);
    }

    let bytes = if src.starts_with("https://") {
        debug!("fetching image {src}");
        fetcher.fetch(src).map_err(|reason| ImageError::Network {
            url: src.to_string(),
            reason,
        })?
    } else if src.starts_with("data:") {
        decode_data_url(src)?
    } else {
        return Err(ImageError::Decode {
            reason: format!("unsupported image source {}", truncate_for_log(src)),
        });
    };

    fit_image(&bytes, max_width, max_height)
}

/// Payload of a base64 `data:` URL
fn decode_data_url(src: &str) -> Result<Vec<u8>, ImageError> {
    let Some((header, payload)) = src.split_once(',') else {
        return Err(ImageError::Decode {
            reason: "data URL has no payload".to_string(),
        });
    };
    if !header.ends_with(";base64") {
        return Err(ImageError::Decode {
            reason: "only base64 data URLs are supported".to_string(),
        });
    }

    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(&payload)
        .or_else(|_| URL_SAFE.decode(&payload))
        .map_err(|err| ImageError::Decode {
            reason: err.to_string(),
        })
}

/// Downscale into `max_width` x `max_height` if needed and re-encode
pub fn fit_image(bytes: &[u8], max_width: u32, max_height: u32) -> Result<FittedImage, ImageError> {
    let decode_error = |err: image::ImageError| ImageError::Decode {
        reason: err.to_string(),
    };

    let format = image::guess_format(bytes).map_err(decode_error)?;
    let mut img = image::load_from_memory_with_format(bytes, format).map_err(decode_error)?;

    let (width, height) = img.dimensions();
    if width > max_width || height > max_height {
        img = img.resize(max_width, max_height, FilterType::Lanczos3);
        debug!(
            "image scaled from {width}x{height} to {}x{}",
            img.width(),
            img.height()
        );
    }

    let mut encoded = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut encoded), 90);
            img.to_rgb8().write_with_encoder(encoder).map_err(decode_error)?;
        }
        _ => img
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(decode_error)?,
    }

    Ok(FittedImage {
        bytes: encoded,
        width: img.width(),
        height: img.height(),
    })
}

fn truncate_for_log(src: &str) -> String {
    src.chars().take(60).collect()
}
