//! Epub Document Assembler
//!
//! This module provides functionality for assembling EPUB 3 packages from
//! caller-supplied content sections and assets. The `EpubDocument` structure
//! collects sections and assets in insertion order, synthesizes the cover
//! page and table-of-contents documents, and serializes the whole package
//! into a single ZIP archive with the member layout the EPUB specification
//! mandates (an uncompressed `mimetype` entry first).
//!
//! ## Usage
//!
//! ```rust, no_run
//! # fn main() -> Result<(), epub_assembler::error::EpubError> {
//! use epub_assembler::{
//!     document::EpubDocument,
//!     types::{Asset, Section},
//! };
//!
//! let mut document = EpubDocument::new("my-book", "Jane Doe", "urn:isbn:1234567890", "books");
//! document
//!     .set_cover(Asset::new("assets/cover.png", "cover.png", "image/png"))?
//!     .add_css(Asset::new("assets/style.css", "style.css", "text/css"))?
//!     .add_section(Section::new(
//!         "chapter1",
//!         "Chapter 1",
//!         "<h1>Chapter 1</h1><p>This is the content of Chapter 1.</p>",
//!     ))?;
//!
//! let epub_path = document.generate()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Notes
//!
//! - Section content must be well-formed XML fragments; malformed markup
//!   fails the generation at serialization time.
//! - `generate()` consumes the assembler. A failed generation leaves no
//!   usable output and is re-driven from a fresh instance.

use std::{
    collections::HashSet,
    fs::{self, File},
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;
use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use zip::{CompressionMethod, ZipWriter, write::FileOptions};

use crate::{
    error::EpubError,
    types::{Asset, PathPrefix, RegisteredAsset, Section},
    utils::{CONTENT_ROOT, modified_timestamp},
};

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Section name reserved for the synthesized table of contents
const TOC_SECTION_NAME: &str = "toc";

/// Section name reserved for the synthesized cover page
const COVER_SECTION_NAME: &str = "cover-page";

/// EPUB Document Assembler
///
/// The main structure used to assemble EPUB ebook packages. Sections and
/// assets are registered in reading order; `generate()` turns them into a
/// finished `.epub` archive and returns its path.
///
/// Section names and asset file names share one manifest id namespace, and
/// registration fails fast on a duplicate instead of silently overwriting
/// an archive entry later.
#[derive(Debug)]
pub struct EpubDocument {
    /// The EPUB display name, also used as the output file stem
    name: String,

    /// The author of the publication
    author: String,

    /// The unique identifier, written verbatim into the package metadata
    identifier: String,

    /// Directory the `.epub` file is written to
    output_dir: PathBuf,

    /// Manifest id of the registered cover asset, if any
    ///
    /// The cover is a regular entry of the asset list; this field only
    /// remembers which one it is, so the two never hold separate copies.
    cover: Option<String>,

    /// Caller-supplied sections, keyed by name, in insertion order
    sections: IndexMap<String, Section>,

    /// Registered assets, keyed by file name, in insertion order
    assets: IndexMap<String, RegisteredAsset>,
}

impl EpubDocument {
    /// Create a new assembler
    ///
    /// Performs no I/O; the output directory is only touched by `generate()`.
    ///
    /// # Parameters
    /// - `name`: The EPUB display name, also used as the output file stem
    /// - `author`: The author of the publication
    /// - `identifier`: The unique identifier, used verbatim
    /// - `output_dir`: The directory where the EPUB file should be saved to
    pub fn new<P: AsRef<Path>>(name: &str, author: &str, identifier: &str, output_dir: P) -> Self {
        EpubDocument {
            name: name.to_string(),
            author: author.to_string(),
            identifier: identifier.to_string(),
            output_dir: output_dir.as_ref().to_path_buf(),

            cover: None,
            sections: IndexMap::new(),
            assets: IndexMap::new(),
        }
    }

    /// Add a content section
    ///
    /// Sections are kept in insertion order, which becomes the reading
    /// order of the spine (after the synthesized cover page and table of
    /// contents).
    ///
    /// # Parameters
    /// - `section`: Section to add
    ///
    /// # Return
    /// - `Ok(&mut Self)`: Successful addition, returns a reference to itself
    /// - `Err(EpubError)`: The name is reserved or already registered
    pub fn add_section(&mut self, section: Section) -> Result<&mut Self, EpubError> {
        if section.name == TOC_SECTION_NAME || section.name == COVER_SECTION_NAME {
            return Err(EpubError::ReservedSectionName { name: section.name });
        }

        if self.id_in_use(&section.name) {
            return Err(EpubError::DuplicateResourceId { id: section.name });
        }

        self.sections.insert(section.name.clone(), section);
        Ok(self)
    }

    /// Add an image asset
    ///
    /// The asset is placed under the `img` directory of the content root;
    /// its href is fixed at this point.
    ///
    /// # Parameters
    /// - `asset`: Asset to embed
    pub fn add_image(&mut self, asset: Asset) -> Result<&mut Self, EpubError> {
        self.register_asset(asset, PathPrefix::Img)?;
        Ok(self)
    }

    /// Add a stylesheet asset
    ///
    /// The asset is placed under the `css` directory of the content root.
    /// Every generated content document links every registered stylesheet.
    ///
    /// # Parameters
    /// - `asset`: Asset to embed
    pub fn add_css(&mut self, asset: Asset) -> Result<&mut Self, EpubError> {
        self.register_asset(asset, PathPrefix::Css)?;
        Ok(self)
    }

    /// Set the cover image
    ///
    /// The cover is registered as a regular `img` asset exactly once; a
    /// synthesized cover page referencing it is prepended to the reading
    /// order during generation.
    ///
    /// # Parameters
    /// - `asset`: Cover image asset
    ///
    /// # Return
    /// - `Ok(&mut Self)`: Successful addition, returns a reference to itself
    /// - `Err(EpubError)`: A cover is already set, or the id is taken
    pub fn set_cover(&mut self, asset: Asset) -> Result<&mut Self, EpubError> {
        if self.cover.is_some() {
            return Err(EpubError::CoverAlreadySet);
        }

        let id = self.register_asset(asset, PathPrefix::Img)?;
        self.cover = Some(id);
        Ok(self)
    }

    /// Generate the EPUB file
    ///
    /// This is the single side-effecting operation of the assembler. The
    /// archive entries are written in the mandated order: the uncompressed
    /// `mimetype` first, then embedded assets, the container pointer, the
    /// package document, and one XHTML document per section (synthesized
    /// cover page and table of contents included).
    ///
    /// Every I/O operation is attempted once; on failure the half-written
    /// output file is not cleaned up, only the archive handle is released.
    ///
    /// # Return
    /// - `Ok(PathBuf)`: The absolute path of the generated file
    /// - `Err(EpubError)`: Error occurred during generation
    pub fn generate(self) -> Result<PathBuf, EpubError> {
        let output_path = self.output_dir.join(format!("{}.epub", self.name));
        let file = File::create(&output_path)?;
        let mut zip = ZipWriter::new(file);

        // The mimetype entry must be first and stored uncompressed so that
        // readers can identify the format from the fixed leading bytes
        // without parsing the whole archive.
        let stored = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        let deflated = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

        self.embed_assets(&mut zip, deflated)?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(&self.make_container_xml()?)?;

        // The synthesized sections join the reading order ahead of the
        // caller sections: cover page first, then the table of contents.
        let sections = self.reading_order()?;

        zip.start_file(format!("{}/package.opf", CONTENT_ROOT), deflated)?;
        zip.write_all(&self.make_package_document(&sections)?)?;

        for section in &sections {
            debug!("writing content document {}/{}", CONTENT_ROOT, section.href());

            zip.start_file(format!("{}/{}", CONTENT_ROOT, section.href()), deflated)?;
            zip.write_all(&self.make_section_document(section)?)?;
        }

        zip.finish()?;

        let output_path = fs::canonicalize(output_path)?;
        debug!("epub archive finalized at {}", output_path.display());

        Ok(output_path)
    }

    /// Register an asset under the given path prefix
    ///
    /// Computes the href immediately and checks the manifest id for
    /// uniqueness against all sections and assets registered so far.
    fn register_asset(&mut self, asset: Asset, prefix: PathPrefix) -> Result<String, EpubError> {
        let id = asset.file_name.clone();
        if self.id_in_use(&id) {
            return Err(EpubError::DuplicateResourceId { id });
        }

        self.assets
            .insert(id.clone(), RegisteredAsset::new(asset, prefix));

        Ok(id)
    }

    /// Check whether a manifest id is taken by a section or an asset
    fn id_in_use(&self, id: &str) -> bool {
        self.sections.contains_key(id) || self.assets.contains_key(id)
    }

    /// Copy every registered asset into the archive
    ///
    /// The `img`/`css` directory entry is created at most once per prefix,
    /// tracked by exact path membership. Asset bytes are read here for the
    /// first time; a missing source file fails the embedding step.
    fn embed_assets(
        &self,
        zip: &mut ZipWriter<File>,
        options: FileOptions<'_, ()>,
    ) -> Result<(), EpubError> {
        let mut created_dirs = HashSet::new();

        for registered in self.assets.values() {
            let directory = format!("{}/{}", CONTENT_ROOT, registered.prefix.as_str());
            if created_dirs.insert(directory.clone()) {
                zip.add_directory(directory, options)?;
            }

            let bytes = fs::read(&registered.asset.source_path).map_err(|source| {
                EpubError::AssetNotReadable {
                    path: registered.asset.source_path.to_string_lossy().to_string(),
                    source,
                }
            })?;

            zip.start_file(format!("{}/{}", CONTENT_ROOT, registered.href), options)?;
            zip.write_all(&bytes)?;
        }

        Ok(())
    }

    /// Compute the final section list
    ///
    /// Prepends the synthesized cover page (when a cover is set) and the
    /// table of contents to the caller sections. The returned order governs
    /// the manifest, the spine, and the emitted content documents.
    fn reading_order(&self) -> Result<Vec<Section>, EpubError> {
        let mut sections = Vec::with_capacity(self.sections.len() + 2);

        if let Some(registered) = self.cover.as_ref().and_then(|id| self.assets.get(id)) {
            sections.push(Section::new(
                COVER_SECTION_NAME,
                "Cover",
                &Self::make_cover_fragment(&registered.href)?,
            ));
        }

        sections.push(Section::new(
            TOC_SECTION_NAME,
            "Table of Contents",
            &self.make_toc_fragment()?,
        ));

        sections.extend(self.sections.values().cloned());

        Ok(sections)
    }

    /// Creates the `container.xml` content
    ///
    /// The shape of this document never varies across books; it only points
    /// readers at the package document inside the content root.
    fn make_container_xml(&self) -> Result<Vec<u8>, EpubError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        writer.write_event(Event::Start(BytesStart::new("container").with_attributes(
            [
                ("version", "1.0"),
                ("xmlns", "urn:oasis:names:tc:opendocument:xmlns:container"),
            ],
        )))?;
        writer.write_event(Event::Start(BytesStart::new("rootfiles")))?;

        writer.write_event(Event::Empty(BytesStart::new("rootfile").with_attributes([
            ("full-path", format!("{}/package.opf", CONTENT_ROOT).as_str()),
            ("media-type", "application/oebps-package+xml"),
        ])))?;

        writer.write_event(Event::End(BytesEnd::new("rootfiles")))?;
        writer.write_event(Event::End(BytesEnd::new("container")))?;

        Ok(writer.into_inner().into_inner())
    }

    /// Creates the content fragment of the synthesized cover page
    fn make_cover_fragment(href: &str) -> Result<String, EpubError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Empty(BytesStart::new("img").with_attributes([(
            "src",
            format!("../{}", href).as_str(),
        )])))?;

        Ok(String::from_utf8(writer.into_inner().into_inner())?)
    }

    /// Creates the content fragment of the synthesized table of contents
    ///
    /// Only caller-supplied sections are listed; the cover page and the
    /// table of contents itself stay out of the navigation list.
    fn make_toc_fragment(&self) -> Result<String, EpubError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Start(BytesStart::new("h1")))?;
        writer.write_event(Event::Text(BytesText::new("Table of Contents")))?;
        writer.write_event(Event::End(BytesEnd::new("h1")))?;

        writer.write_event(Event::Start(BytesStart::new("nav").with_attributes([
            ("id", "toc"),
            ("epub:type", "toc"),
        ])))?;
        writer.write_event(Event::Start(BytesStart::new("ol")))?;

        for section in self.sections.values() {
            writer.write_event(Event::Start(BytesStart::new("li")))?;
            writer.write_event(Event::Start(
                BytesStart::new("a").with_attributes([("href", section.href().as_str())]),
            ))?;
            writer.write_event(Event::Text(BytesText::new(&section.title)))?;
            writer.write_event(Event::End(BytesEnd::new("a")))?;
            writer.write_event(Event::End(BytesEnd::new("li")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("ol")))?;
        writer.write_event(Event::End(BytesEnd::new("nav")))?;

        Ok(String::from_utf8(writer.into_inner().into_inner())?)
    }

    /// Creates the package document
    ///
    /// The package document carries the publication metadata, the manifest
    /// of every file in the archive, and the spine defining the linear
    /// reading order.
    fn make_package_document(&self, sections: &[Section]) -> Result<Vec<u8>, EpubError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        writer.write_event(Event::Start(BytesStart::new("package").with_attributes([
            ("xmlns", "http://www.idpf.org/2007/opf"),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("unique-identifier", "pub-identifier"),
            ("version", "3.0"),
        ])))?;

        self.make_package_metadata(&mut writer)?;
        self.make_package_manifest(&mut writer, sections)?;
        Self::make_package_spine(&mut writer, sections)?;

        writer.write_event(Event::End(BytesEnd::new("package")))?;

        Ok(writer.into_inner().into_inner())
    }

    fn make_package_metadata(&self, writer: &mut XmlWriter) -> Result<(), EpubError> {
        writer.write_event(Event::Start(BytesStart::new("metadata")))?;

        writer.write_event(Event::Start(
            BytesStart::new("dc:identifier").with_attributes([("id", "pub-identifier")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(&self.identifier)))?;
        writer.write_event(Event::End(BytesEnd::new("dc:identifier")))?;

        writer.write_event(Event::Start(BytesStart::new("dc:title")))?;
        writer.write_event(Event::Text(BytesText::new(&self.name)))?;
        writer.write_event(Event::End(BytesEnd::new("dc:title")))?;

        writer.write_event(Event::Start(BytesStart::new("dc:creator")))?;
        writer.write_event(Event::Text(BytesText::new(&self.author)))?;
        writer.write_event(Event::End(BytesEnd::new("dc:creator")))?;

        writer.write_event(Event::Start(BytesStart::new("dc:language")))?;
        writer.write_event(Event::Text(BytesText::new("en")))?;
        writer.write_event(Event::End(BytesEnd::new("dc:language")))?;

        writer.write_event(Event::Start(
            BytesStart::new("meta").with_attributes([("property", "dcterms:modified")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(&modified_timestamp())))?;
        writer.write_event(Event::End(BytesEnd::new("meta")))?;

        if let Some(cover_id) = &self.cover {
            writer.write_event(Event::Empty(BytesStart::new("meta").with_attributes([
                ("name", "cover"),
                ("content", cover_id.as_str()),
            ])))?;
        }

        writer.write_event(Event::End(BytesEnd::new("metadata")))?;

        Ok(())
    }

    fn make_package_manifest(
        &self,
        writer: &mut XmlWriter,
        sections: &[Section],
    ) -> Result<(), EpubError> {
        writer.write_event(Event::Start(BytesStart::new("manifest")))?;

        for section in sections {
            let href = section.href();

            let mut item = BytesStart::new("item");
            item.push_attribute(("id", section.name.as_str()));
            item.push_attribute(("href", href.as_str()));
            item.push_attribute(("media-type", "application/xhtml+xml"));
            if section.name == TOC_SECTION_NAME {
                item.push_attribute(("properties", "nav"));
            }

            writer.write_event(Event::Empty(item))?;
        }

        for registered in self.assets.values() {
            let mut item = BytesStart::new("item");
            item.push_attribute(("id", registered.asset.file_name.as_str()));
            item.push_attribute(("href", registered.href.as_str()));
            item.push_attribute(("media-type", registered.asset.media_type.as_str()));
            if self.cover.as_deref() == Some(registered.asset.file_name.as_str()) {
                item.push_attribute(("properties", "cover-image"));
            }

            writer.write_event(Event::Empty(item))?;
        }

        writer.write_event(Event::End(BytesEnd::new("manifest")))?;

        Ok(())
    }

    fn make_package_spine(writer: &mut XmlWriter, sections: &[Section]) -> Result<(), EpubError> {
        writer.write_event(Event::Start(BytesStart::new("spine")))?;

        for section in sections {
            writer.write_event(Event::Empty(
                BytesStart::new("itemref").with_attributes([("idref", section.name.as_str())]),
            ))?;
        }

        writer.write_event(Event::End(BytesEnd::new("spine")))?;

        Ok(())
    }

    /// Creates one content document
    ///
    /// Every section is wrapped in the same XHTML shell: a head with the
    /// section title and one stylesheet link per registered CSS asset, and
    /// a body holding the raw content fragment.
    fn make_section_document(&self, section: &Section) -> Result<Vec<u8>, EpubError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::DocType(BytesText::new("html")))?;

        writer.write_event(Event::Start(BytesStart::new("html").with_attributes([
            ("xmlns", "http://www.w3.org/1999/xhtml"),
            ("xmlns:epub", "http://www.idpf.org/2007/ops"),
        ])))?;

        // make head
        writer.write_event(Event::Start(BytesStart::new("head")))?;
        writer.write_event(Event::Start(BytesStart::new("title")))?;
        writer.write_event(Event::Text(BytesText::new(&section.title)))?;
        writer.write_event(Event::End(BytesEnd::new("title")))?;

        for registered in self.assets.values() {
            if registered.prefix != PathPrefix::Css {
                continue;
            }

            writer.write_event(Event::Empty(BytesStart::new("link").with_attributes([
                ("rel", "stylesheet"),
                ("type", "text/css"),
                ("href", registered.href.as_str()),
            ])))?;
        }

        writer.write_event(Event::End(BytesEnd::new("head")))?;

        // make body, attaching the fragment without re-escaping
        writer.write_event(Event::Start(BytesStart::new("body")))?;
        Self::inject_fragment(&mut writer, &section.name, &section.content)?;
        writer.write_event(Event::End(BytesEnd::new("body")))?;

        writer.write_event(Event::End(BytesEnd::new("html")))?;

        Ok(writer.into_inner().into_inner())
    }

    /// Inject a raw markup fragment
    ///
    /// The fragment is re-parsed event by event and attached to the output
    /// writer. A parse error means the fragment is not well-formed XML and
    /// fails the generation.
    fn inject_fragment(
        writer: &mut XmlWriter,
        section: &str,
        fragment: &str,
    ) -> Result<(), EpubError> {
        let mut reader = Reader::from_str(fragment);

        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,

                Ok(event) => writer.write_event(event)?,

                Err(err) => {
                    return Err(EpubError::MalformedFragment {
                        section: section.to_string(),
                        source: err,
                    });
                }
            }
        }

        Ok(())
    }
}
