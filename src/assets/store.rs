use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    assets::decode as assets_decode,
    foundation::error::{TickreelError, TickreelResult},
};

#[derive(Clone, Debug, PartialEq)]
/// Decoded raster image in premultiplied RGBA8 form.
pub struct ImageAsset {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

#[derive(Clone, Debug, Default)]
/// Read-only lookup table of decoded assets, keyed by manifest asset id.
///
/// IO happens in [`AssetStore::load`]; lookups during rendering never touch the filesystem.
pub struct AssetStore {
    root: PathBuf,
    sources: BTreeMap<String, String>,
    images: BTreeMap<String, ImageAsset>,
}

impl AssetStore {
    /// Empty store; blueprints see no assets.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode every image in `sources` (asset id -> location). Relative locations resolve against
    /// `root`; `file://` prefixes are accepted.
    pub fn load(sources: &BTreeMap<String, String>, root: impl Into<PathBuf>) -> TickreelResult<Self> {
        let mut out = Self {
            root: root.into(),
            sources: sources.clone(),
            images: BTreeMap::new(),
        };
        for (id, location) in sources {
            let path = out.resolve_location(location)?;
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read asset '{id}' from '{}'", path.display()))?;
            let image = assets_decode::decode_image(&bytes)?;
            tracing::debug!(asset = %id, width = image.width, height = image.height, "decoded image asset");
            out.images.insert(id.clone(), image);
        }
        Ok(out)
    }

    /// Decode the same sources again into an independent store.
    ///
    /// Images added with [`AssetStore::insert_image`] have no source and are carried over as-is.
    pub fn reload(&self) -> TickreelResult<Self> {
        let mut out = Self::load(&self.sources, self.root.clone())?;
        for (id, image) in &self.images {
            if !self.sources.contains_key(id) {
                out.images.insert(id.clone(), image.clone());
            }
        }
        Ok(out)
    }

    /// Insert an already-decoded image.
    pub fn insert_image(&mut self, id: impl Into<String>, image: ImageAsset) {
        self.images.insert(id.into(), image);
    }

    /// Decoded image registered under `id`.
    pub fn image(&self, id: &str) -> Option<&ImageAsset> {
        self.images.get(id)
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Return `true` when no images are loaded.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Directory relative locations were resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_location(&self, location: &str) -> TickreelResult<PathBuf> {
        let location = location.strip_prefix("file://").unwrap_or(location);
        if location.contains("://") {
            return Err(TickreelError::validation(format!(
                "asset location '{location}' is not a local file; fetch remote assets before rendering"
            )));
        }
        let p = Path::new(location);
        if p.is_absolute() {
            return Ok(p.to_path_buf());
        }
        Ok(self.root.join(normalize_rel_path(location)?))
    }
}

/// Normalize and validate manifest-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects parent traversals
/// (`..`).
pub fn normalize_rel_path(source: &str) -> TickreelResult<String> {
    let s = source.replace('\\', "/");
    if s.is_empty() {
        return Err(TickreelError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(TickreelError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(TickreelError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
