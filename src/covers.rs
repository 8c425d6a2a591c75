use crate::color;
use crate::models::{Book, Catalogue};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use log::{info, warn};
use reqwest::blocking::Client as HttpClient;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Thumbnails and square tiles are capped at this edge length.
pub const THUMBNAIL_EDGE: u32 = 240;
const JPEG_QUALITY: u8 = 95;
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("failed to decode cover image: {0}")]
    Image(#[from] image::ImageError),
    #[error("cover download failed: {0}")]
    Download(#[from] reqwest::Error),
    #[error("cover file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("book has no cover source url")]
    MissingSource,
}

/// Media directory holding covers and their derived images.
///
/// Every book gets its own directory under the root:
/// `<root>/<author-slug>/<title-slug>/{cover.jpg,thumbnail.jpg,square.png}`.
#[derive(Debug, Clone)]
pub struct CoverStore {
    root: PathBuf,
}

impl CoverStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        CoverStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative path a freshly stored cover gets, `<slug>/cover.jpg`.
    pub fn cover_rel(book: &Book) -> String {
        format!("{}/cover.jpg", book.slug())
    }

    /// Absolute path of the stored cover, if the book has one.
    pub fn cover_path(&self, book: &Book) -> Option<PathBuf> {
        book.cover.as_ref().map(|rel| self.root.join(rel))
    }

    pub fn thumbnail_path(&self, book: &Book) -> PathBuf {
        self.root.join(book.slug()).join("thumbnail.jpg")
    }

    pub fn square_path(&self, book: &Book) -> PathBuf {
        self.root.join(book.slug()).join("square.png")
    }

    /// Delete the derived images so the next refresh rebuilds them.
    pub fn invalidate_thumbnails(&self, book: &Book) -> Result<(), CoverError> {
        remove_if_exists(&self.thumbnail_path(book))?;
        remove_if_exists(&self.square_path(book))?;
        Ok(())
    }

    /// Rebuild both derived images from the stored cover.
    ///
    /// Also fills in the spine color when it has not been computed yet.
    /// Returns `false` for books without a cover.
    pub fn refresh(&self, book: &mut Book) -> Result<bool, CoverError> {
        let Some(cover_path) = self.cover_path(book) else {
            return Ok(false);
        };
        let cover = image::open(&cover_path)?;
        self.invalidate_thumbnails(book)?;
        fs::create_dir_all(self.root.join(book.slug()))?;
        fs::write(self.thumbnail_path(book), derive_thumbnail(&cover)?)?;
        fs::write(self.square_path(book), derive_square(&cover)?)?;
        if book.spine_color.is_none() {
            book.spine_color = Some(color::spine_color(&cover, color::DEFAULT_CLUSTER_COUNT));
        }
        Ok(true)
    }

    /// Refresh every book that has a cover; failures are logged and skipped
    /// so one broken file cannot stall the batch.
    pub fn refresh_all(&self, catalogue: &mut Catalogue) -> usize {
        let mut refreshed = 0;
        for book in &mut catalogue.books {
            let slug = book.slug();
            match self.refresh(book) {
                Ok(true) => refreshed += 1,
                Ok(false) => {}
                Err(err) => warn!("skipping thumbnails for {slug}: {err}"),
            }
        }
        info!("refreshed thumbnails for {refreshed} books");
        refreshed
    }

    /// Store new cover bytes for a book.
    ///
    /// The previous cover and its derived images are removed, the source URL
    /// is cleared, and the spine color is reset so it gets recomputed from
    /// the new image.
    pub fn store_cover(&self, book: &mut Book, bytes: &[u8]) -> Result<(), CoverError> {
        if let Some(old) = self.cover_path(book) {
            remove_if_exists(&old)?;
        }
        self.invalidate_thumbnails(book)?;
        let rel = Self::cover_rel(book);
        let path = self.root.join(&rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        book.cover = Some(rel);
        book.cover_source = None;
        book.spine_color = None;
        Ok(())
    }
}

/// HTTP client for cover downloads. One attempt, five second timeout, no
/// retries; a dead URL should not hold up a batch run.
#[derive(Debug, Clone)]
pub struct CoverClient {
    http: HttpClient,
}

impl Default for CoverClient {
    fn default() -> Self {
        let http = HttpClient::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .connect_timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("shelf_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        CoverClient { http }
    }
}

impl CoverClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch raw cover bytes; non-2xx responses are errors.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, CoverError> {
        let response = self.http.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Download the cover named by `cover_source` and store it.
pub fn download_cover(
    store: &CoverStore,
    client: &CoverClient,
    book: &mut Book,
) -> Result<(), CoverError> {
    let Some(url) = book.cover_source.clone() else {
        return Err(CoverError::MissingSource);
    };
    let bytes = client.fetch(&url)?;
    store.store_cover(book, &bytes)
}

/// Download covers for every book with a pending source URL.
///
/// Failed downloads are logged and skipped; the source URL stays set so the
/// next run retries them.
pub fn download_all(store: &CoverStore, client: &CoverClient, catalogue: &mut Catalogue) -> usize {
    let mut downloaded = 0;
    for book in &mut catalogue.books {
        if book.cover_source.is_none() {
            continue;
        }
        let slug = book.slug();
        match download_cover(store, client, book) {
            Ok(()) => downloaded += 1,
            Err(err) => warn!("cover download failed for {slug}: {err}"),
        }
    }
    info!("downloaded {downloaded} covers");
    downloaded
}

/// JPEG thumbnail bytes for a cover, shrunk only when the cover is larger
/// than the thumbnail edge in both dimensions.
pub fn derive_thumbnail(cover: &DynamicImage) -> Result<Vec<u8>, CoverError> {
    let mut image = cover.clone();
    if image.width() > THUMBNAIL_EDGE && image.height() > THUMBNAIL_EDGE {
        image = image.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE);
    }
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_to(&mut buffer, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
    Ok(buffer.into_inner())
}

/// PNG bytes for the square tile: the cover scaled to fit, centered on a
/// transparent 240x240 canvas.
pub fn derive_square(cover: &DynamicImage) -> Result<Vec<u8>, CoverError> {
    let mut scaled = cover.clone();
    if scaled.width() > THUMBNAIL_EDGE || scaled.height() > THUMBNAIL_EDGE {
        scaled = scaled.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE);
    }
    let scaled = scaled.to_rgba8();
    let mut canvas = RgbaImage::from_pixel(THUMBNAIL_EDGE, THUMBNAIL_EDGE, Rgba([255, 255, 255, 0]));
    let x = i64::from((THUMBNAIL_EDGE - scaled.width()) / 2);
    let y = i64::from((THUMBNAIL_EDGE - scaled.height()) / 2);
    image::imageops::overlay(&mut canvas, &scaled, x, y);
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas).write_to(&mut buffer, ImageOutputFormat::Png)?;
    Ok(buffer.into_inner())
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
