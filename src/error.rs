//! Error Type Definition Module
//!
//! This module defines the error types that may be encountered while
//! assembling an EPUB package. All errors are uniformly wrapped in the
//! [EpubError] enumeration for convenient error handling by the caller.

use thiserror::Error;

/// Types of errors that can occur during EPUB assembly
///
/// Every variant is fatal for the running `generate()` call: no operation
/// is retried, and a failed generation must be re-driven from a fresh
/// assembler instance.
#[derive(Debug, Error)]
pub enum EpubError {
    /// ZIP archive related errors
    ///
    /// Errors occur when writing the ZIP structure of the EPUB file,
    /// such as an entry that cannot be started or finished.
    #[error("Archive error: {source}")]
    ArchiveError { source: zip::result::ZipError },

    /// Asset source unreadable error
    ///
    /// This error occurs when the source file of a registered asset cannot
    /// be read at embedding time. Asset registration performs no I/O, so a
    /// missing source surfaces here and not earlier.
    #[error("Asset not readable: Unable to read asset source \"{path}\": {source}")]
    AssetNotReadable {
        path: String,
        source: std::io::Error,
    },

    /// Cover already set error
    ///
    /// This error is triggered when a cover asset is assigned twice. The
    /// cover shares its record with the asset list, so re-pointing it would
    /// leave an orphaned image in the manifest.
    #[error("Cover already set: An assembler holds at most one cover asset.")]
    CoverAlreadySet,

    /// Duplicate resource id error
    ///
    /// Section names and asset file names both become manifest ids, and
    /// manifest ids must be unique across the whole publication. Adding a
    /// section or asset whose id is already registered fails immediately.
    #[error("Duplicate resource id: The id \"{id}\" is already registered.")]
    DuplicateResourceId { id: String },

    #[error("IO error: {source}")]
    IOError { source: std::io::Error },

    /// Malformed content fragment error
    ///
    /// This error occurs when a section's HTML fragment is not well-formed
    /// XML and cannot be attached to the generated document body. Content is
    /// not validated at registration time; the failure surfaces when the
    /// owning section is serialized.
    #[error("Malformed fragment: The content of section \"{section}\" is not well-formed: {source}")]
    MalformedFragment {
        section: String,
        source: quick_xml::Error,
    },

    /// Reserved section name error
    ///
    /// The `toc` and `cover-page` names are claimed by the sections the
    /// assembler synthesizes during generation.
    #[error("Reserved section name: The name \"{name}\" is reserved for a synthesized section.")]
    ReservedSectionName { name: String },

    /// QuickXml error
    ///
    /// This error occurs when serializing XML data using the QuickXml library.
    #[error("QuickXml error: {source}")]
    QuickXmlError { source: quick_xml::Error },

    /// UTF-8 decoding error
    ///
    /// This error occurs when attempting to decode generated byte data into
    /// a UTF-8 string but the data is not formatted correctly.
    #[error("Decode error: {source}")]
    Utf8DecodeError { source: std::string::FromUtf8Error },
}

impl From<zip::result::ZipError> for EpubError {
    fn from(value: zip::result::ZipError) -> Self {
        EpubError::ArchiveError { source: value }
    }
}

impl From<quick_xml::Error> for EpubError {
    fn from(value: quick_xml::Error) -> Self {
        EpubError::QuickXmlError { source: value }
    }
}

impl From<std::io::Error> for EpubError {
    fn from(value: std::io::Error) -> Self {
        EpubError::IOError { source: value }
    }
}

impl From<std::string::FromUtf8Error> for EpubError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        EpubError::Utf8DecodeError { source: value }
    }
}

#[cfg(test)]
impl PartialEq for EpubError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::AssetNotReadable { path: l_path, .. },
                Self::AssetNotReadable { path: r_path, .. },
            ) => l_path == r_path,
            (Self::DuplicateResourceId { id: l_id }, Self::DuplicateResourceId { id: r_id }) => {
                l_id == r_id
            }
            (
                Self::MalformedFragment {
                    section: l_section, ..
                },
                Self::MalformedFragment {
                    section: r_section, ..
                },
            ) => l_section == r_section,
            (
                Self::ReservedSectionName { name: l_name },
                Self::ReservedSectionName { name: r_name },
            ) => l_name == r_name,

            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}
