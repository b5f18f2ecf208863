use std::path::{Path, PathBuf};

/// Represents one content document of the publication
///
/// A `Section` holds a unique name, a display title, and an HTML content
/// fragment. The name is used both as the manifest id and as the file stem
/// of the generated XHTML document, so it must be a filename-safe XML id
/// token and unique among all registered resources.
///
/// The content is a fragment, not a full document: it is injected verbatim
/// into the body of a generated XHTML shell at generation time. It must be
/// well-formed XML; malformed markup surfaces as an error when the section
/// is serialized, not when it is added.
#[derive(Debug, Clone)]
pub struct Section {
    /// Unique section identifier, used as manifest id and file stem
    pub name: String,

    /// Human-readable title, shown in the table of contents and in the
    /// document `<title>`
    pub title: String,

    /// HTML content fragment, injected into the generated document body
    pub content: String,
}

impl Section {
    /// Create a new section
    ///
    /// # Parameters
    /// - `name`: Unique section identifier
    /// - `title`: Display title
    /// - `content`: HTML content fragment
    pub fn new(name: &str, title: &str, content: &str) -> Self {
        Section {
            name: name.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    /// Returns the location of the generated document relative to the
    /// content root
    pub fn href(&self) -> String {
        format!("{}.xhtml", self.name)
    }
}

/// Represents one file to embed in the publication
///
/// An `Asset` describes where the bytes live on the local file system, what
/// the file should be called inside the archive, and its media type. It
/// carries no placement state: the in-archive location is fixed when the
/// asset is registered with the assembler (see [RegisteredAsset]).
///
/// No I/O happens at construction or registration time. The source file is
/// only opened when the archive is generated, and a missing or unreadable
/// source surfaces as an embedding-stage error.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Filesystem location of the asset bytes
    pub source_path: PathBuf,

    /// Target file name inside the archive, also used as the manifest id
    pub file_name: String,

    /// MIME string of the asset, e.g. `image/png` or `text/css`
    pub media_type: String,
}

impl Asset {
    /// Create a new asset
    ///
    /// # Parameters
    /// - `source_path`: Filesystem location of the asset bytes
    /// - `file_name`: Target file name inside the archive
    /// - `media_type`: MIME string of the asset
    pub fn new<P: AsRef<Path>>(source_path: P, file_name: &str, media_type: &str) -> Self {
        Asset {
            source_path: source_path.as_ref().to_path_buf(),
            file_name: file_name.to_string(),
            media_type: media_type.to_string(),
        }
    }
}

/// Archive subdirectory an asset is placed under
///
/// Images (including the cover) live under `img`, stylesheets under `css`.
/// The prefix is chosen by the assembler based on the registration method,
/// never by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathPrefix {
    Img,
    Css,
}

impl PathPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathPrefix::Img => "img",
            PathPrefix::Css => "css",
        }
    }
}

/// An asset bound to its archive placement
///
/// Created by the assembler when an asset is registered. The href is
/// computed exactly once, from the prefix and the asset's file name, so a
/// registered asset is never observable in a half-initialized state.
#[derive(Debug)]
pub(crate) struct RegisteredAsset {
    pub asset: Asset,
    pub prefix: PathPrefix,

    /// Location relative to the content root: `{prefix}/{file_name}`
    pub href: String,
}

impl RegisteredAsset {
    pub(crate) fn new(asset: Asset, prefix: PathPrefix) -> Self {
        let href = format!("{}/{}", prefix.as_str(), asset.file_name);
        RegisteredAsset { asset, prefix, href }
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{Asset, PathPrefix, RegisteredAsset, Section};

    #[test]
    fn test_section_href() {
        let section = Section::new("chapter1", "Chapter 1", "<p>text</p>");
        assert_eq!(section.href(), "chapter1.xhtml");
    }

    #[test]
    fn test_path_prefix_as_str() {
        assert_eq!(PathPrefix::Img.as_str(), "img");
        assert_eq!(PathPrefix::Css.as_str(), "css");
    }

    #[test]
    fn test_registered_asset_href() {
        let image = Asset::new("/tmp/cover.png", "cover.png", "image/png");
        let registered = RegisteredAsset::new(image, PathPrefix::Img);
        assert_eq!(registered.href, "img/cover.png");

        let style = Asset::new("/tmp/style.css", "style.css", "text/css");
        let registered = RegisteredAsset::new(style, PathPrefix::Css);
        assert_eq!(registered.href, "css/style.css");
    }

    #[test]
    fn test_href_follows_file_name() {
        // Renaming before registration must flow into the derived href.
        let mut asset = Asset::new("/tmp/cover.png", "cover.png", "image/png");
        asset.file_name = "front.png".to_string();

        let registered = RegisteredAsset::new(asset, PathPrefix::Img);
        assert_eq!(registered.href, "img/front.png");
        assert_eq!(registered.asset.file_name, "front.png");
    }
}
