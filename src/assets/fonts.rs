use std::path::Path;
use std::sync::Arc;

use usvg::fontdb;

use crate::assets::store::{read_asset_bytes, resolve_asset_path};
use crate::foundation::error::{ReelError, ReelResult};

/// Where caption glyphs come from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum FontSource {
    /// Installed (or extra-directory) font looked up by family name.
    ///
    /// Resolution never falls back to a different family.
    System {
        /// Family name, e.g. `Arial`.
        family: String,
        /// CSS weight (400 regular, 700 bold).
        #[serde(default = "default_weight")]
        weight: u16,
        /// Italic style.
        #[serde(default)]
        italic: bool,
    },
    /// Font file relative to the assets root.
    File {
        /// Relative path to a `.ttf`/`.otf`/`.ttc`.
        path: String,
        /// Face index within a collection.
        #[serde(default)]
        index: u32,
    },
}

fn default_weight() -> u16 {
    400
}

impl FontSource {
    /// Parse an ImageMagick-style face name such as `Arial-Bold` or `Helvetica-BoldOblique`.
    ///
    /// Unknown suffixes are kept as part of the family name.
    pub fn from_face_name(name: &str) -> Self {
        let (family, style) = match name.rsplit_once('-') {
            Some((fam, style)) if !fam.is_empty() => (fam, style.to_ascii_lowercase()),
            _ => (name, String::new()),
        };
        let (weight, italic) = match style.as_str() {
            "bold" => (700, false),
            "italic" | "oblique" => (400, true),
            "bolditalic" | "boldoblique" => (700, true),
            "regular" => (400, false),
            _ => {
                return Self::System {
                    family: name.to_string(),
                    weight: 400,
                    italic: false,
                };
            }
        };
        Self::System {
            family: family.to_string(),
            weight,
            italic,
        }
    }
}

/// Font bytes ready for shaping and rasterization.
#[derive(Clone, Debug)]
pub struct ResolvedFont {
    /// Family name reported by the font.
    pub family: String,
    /// Whole font file contents.
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside `bytes`.
    pub index: u32,
}

/// Font database used to resolve [`FontSource`] values.
pub struct FontResolver {
    db: fontdb::Database,
}

impl FontResolver {
    /// Resolver over installed system fonts.
    pub fn with_system_fonts() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self { db }
    }

    /// Resolver with no fonts; add directories with [`FontResolver::load_dir`].
    pub fn empty() -> Self {
        Self {
            db: fontdb::Database::new(),
        }
    }

    /// Number of faces known to the resolver.
    pub fn face_count(&self) -> usize {
        self.db.faces().count()
    }

    #[cfg(test)]
    pub(crate) fn first_family(&self) -> Option<String> {
        const PREFERRED: [&str; 5] = [
            "DejaVu Sans",
            "Liberation Sans",
            "Arial",
            "Noto Sans",
            "Helvetica",
        ];
        let names = self
            .db
            .faces()
            .filter_map(|f| f.families.first().map(|(name, _)| name.clone()))
            .collect::<Vec<_>>();
        PREFERRED
            .iter()
            .find_map(|p| names.iter().find(|n| n.as_str() == *p).cloned())
            .or_else(|| names.into_iter().next())
    }

    /// Load every `.ttf`/`.otf`/`.ttc` directly inside `dir`. Missing directories are ignored.
    pub fn load_dir(&mut self, dir: &Path) {
        let Ok(rd) = std::fs::read_dir(dir) else {
            return;
        };

        for entry in rd.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
                continue;
            };
            let ext = ext.to_ascii_lowercase();
            if ext != "ttf" && ext != "otf" && ext != "ttc" {
                continue;
            }
            if let Err(e) = self.db.load_font_file(&path) {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable font file");
            }
        }
    }

    /// Resolve `source` to font bytes. File paths are relative to `assets_root`.
    pub fn resolve(&self, source: &FontSource, assets_root: &Path) -> ReelResult<ResolvedFont> {
        match source {
            FontSource::System {
                family,
                weight,
                italic,
            } => self.resolve_family(family, *weight, *italic),
            FontSource::File { path, index } => {
                let p = resolve_asset_path(assets_root, path)?;
                let bytes = read_asset_bytes(&p, "font file")
                    .map_err(|e| ReelError::font(e.to_string()))?;
                let family = family_name_of(&bytes, *index).ok_or_else(|| {
                    ReelError::font(format!(
                        "font file '{}' has no face {index} with a family name",
                        p.display()
                    ))
                })?;
                Ok(ResolvedFont {
                    family,
                    bytes: Arc::new(bytes),
                    index: *index,
                })
            }
        }
    }

    fn resolve_family(&self, family: &str, weight: u16, italic: bool) -> ReelResult<ResolvedFont> {
        let families = [fontdb::Family::Name(family)];
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight(weight),
            stretch: fontdb::Stretch::Normal,
            style: if italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            },
        };
        let id = self.db.query(&query).ok_or_else(|| {
            ReelError::font(format!(
                "font family '{family}' (weight {weight}) is not available ({} faces searched)",
                self.face_count()
            ))
        })?;
        let (bytes, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| ReelError::font(format!("failed to load font data for '{family}'")))?;
        Ok(ResolvedFont {
            family: family.to_string(),
            bytes: Arc::new(bytes),
            index,
        })
    }
}

fn family_name_of(bytes: &[u8], index: u32) -> Option<String> {
    let mut db = fontdb::Database::new();
    db.load_font_data(bytes.to_vec());
    db.faces()
        .find(|f| f.index == index)
        .and_then(|f| f.families.first())
        .map(|(name, _)| name.clone())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
