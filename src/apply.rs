//! End-to-end patching pipeline.
//!
//! One linear sequence per invocation: extract the manifest, decode it,
//! apply the overrides, re-encode, and rewrite the container. Each stage
//! is terminal on failure. Every output is staged in a temporary file in
//! the destination directory and atomically renamed over the original
//! only after a complete, successful write, so a failure anywhere in the
//! pipeline never leaves a half-written artifact behind.

use std::io::Write;
use std::path::Path;

use crate::container::Archive;
use crate::convert::{Converter, Direction};
use crate::manifest::Document;
use crate::patch::{AppliedChange, PatchRequest};
use crate::{Error, Result};

/// Manifest entry path inside a proto-converted package.
pub const APK_MANIFEST_PATH: &str = "AndroidManifest.xml";
/// Manifest entry path inside an app bundle.
pub const BUNDLE_MANIFEST_PATH: &str = "base/manifest/AndroidManifest.xml";

/// The kind of artifact being patched, detected from the path extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// A fully-binary package; patched through the converter round trip.
    Apk,
    /// An app bundle carrying the proto manifest directly.
    Bundle,
    /// A bare binary manifest document, no container.
    Manifest,
}

impl PackageKind {
    /// Detects the kind from the file extension.
    ///
    /// Anything that is neither `.apk` nor `.aab` is treated as a bare
    /// manifest document.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("apk") => PackageKind::Apk,
            Some("aab") => PackageKind::Bundle,
            _ => PackageKind::Manifest,
        }
    }

    /// The manifest entry path for container kinds.
    pub fn manifest_path(self) -> Option<&'static str> {
        match self {
            PackageKind::Apk => Some(APK_MANIFEST_PATH),
            PackageKind::Bundle => Some(BUNDLE_MANIFEST_PATH),
            PackageKind::Manifest => None,
        }
    }
}

/// Result of one patch invocation.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// The detected artifact kind.
    pub kind: PackageKind,
    /// The overrides that found their target attribute, in document order.
    pub changes: Vec<AppliedChange>,
}

/// Patches the artifact at `path` in place.
///
/// The artifact kind is detected from the extension; see [`PackageKind`].
/// Returns the applied changes for reporting. An unmatched override is not
/// an error; the request is a best-effort overlay.
pub fn patch_path(path: &Path, request: &PatchRequest) -> Result<PatchOutcome> {
    let kind = PackageKind::detect(path);
    log::debug!("patching {} as {kind:?}", path.display());
    let changes = match kind {
        PackageKind::Apk => patch_apk(path, request)?,
        PackageKind::Bundle => patch_archive(path, BUNDLE_MANIFEST_PATH, request)?,
        PackageKind::Manifest => patch_manifest_file(path, request)?,
    };
    Ok(PatchOutcome { kind, changes })
}

/// Decode, mutate, re-encode.
fn patch_manifest_bytes(
    bytes: &[u8],
    request: &PatchRequest,
) -> Result<(Vec<u8>, Vec<AppliedChange>)> {
    let mut document = Document::decode(bytes)?;
    let changes = request.apply_to(&mut document);
    Ok((document.encode(), changes))
}

/// Patches a bare manifest document file.
pub fn patch_manifest_file(path: &Path, request: &PatchRequest) -> Result<Vec<AppliedChange>> {
    let bytes = std::fs::read(path)?;
    let (patched, changes) = patch_manifest_bytes(&bytes, request)?;
    write_atomic(path, &patched)?;
    Ok(changes)
}

/// Patches the manifest entry of a zip container in place.
fn patch_archive(
    path: &Path,
    manifest_path: &str,
    request: &PatchRequest,
) -> Result<Vec<AppliedChange>> {
    let archive = Archive::open_path(path)?;
    let manifest = archive.extract(manifest_path)?;
    let (patched, changes) = patch_manifest_bytes(&manifest, request)?;
    let rewritten = archive.replace_entry(manifest_path, &patched)?;
    write_atomic(path, &rewritten)?;
    Ok(changes)
}

/// Patches a fully-binary package through the converter round trip.
///
/// The package is converted to its proto intermediate in a scoped temp
/// file, the intermediate's manifest entry is patched, and the result is
/// converted back and renamed over the original. Both temp files are
/// removed on every exit path.
fn patch_apk(path: &Path, request: &PatchRequest) -> Result<Vec<AppliedChange>> {
    let converter = Converter::from_env();
    let dir = staging_dir(path);

    let intermediate = tempfile::Builder::new()
        .prefix(".apkbump-")
        .suffix(".zip")
        .tempfile_in(dir)?;
    converter.convert(path, intermediate.path(), Direction::Proto)?;

    let changes = patch_archive(intermediate.path(), APK_MANIFEST_PATH, request)?;

    let converted = tempfile::Builder::new()
        .prefix(".apkbump-")
        .suffix(".apk")
        .tempfile_in(dir)?;
    converter.convert(intermediate.path(), converted.path(), Direction::Binary)?;
    converted.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok(changes)
}

fn staging_dir(path: &Path) -> &Path {
    // Stage next to the target so the final rename never crosses a
    // filesystem boundary.
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Writes `bytes` to a temp file beside `path` and renames it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut staged = tempfile::Builder::new()
        .prefix(".apkbump-")
        .tempfile_in(staging_dir(path))?;
    staged.write_all(bytes)?;
    staged.flush()?;
    staged.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::test_util::{build_zip, ZipSpec};
    use crate::manifest::{Attribute, CompiledValue, Element};
    use crate::patch::ANDROID_NAMESPACE;

    fn sample_manifest_bytes() -> Vec<u8> {
        Document {
            root: Element {
                namespace_decls: vec![],
                namespace_uri: String::new(),
                name: "manifest".into(),
                attributes: vec![
                    Attribute {
                        namespace_uri: String::new(),
                        name: "package".into(),
                        value: "com.example.old".into(),
                        source: None,
                        resource_id: 0,
                        compiled: None,
                    },
                    Attribute {
                        namespace_uri: ANDROID_NAMESPACE.into(),
                        name: "versionCode".into(),
                        value: "5".into(),
                        source: None,
                        resource_id: 0,
                        compiled: Some(CompiledValue::IntDecimal(5)),
                    },
                ],
                children: vec![],
            },
            source: None,
        }
        .encode()
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(PackageKind::detect(Path::new("app.apk")), PackageKind::Apk);
        assert_eq!(PackageKind::detect(Path::new("app.aab")), PackageKind::Bundle);
        assert_eq!(
            PackageKind::detect(Path::new("AndroidManifest.xml")),
            PackageKind::Manifest
        );
        assert_eq!(
            PackageKind::detect(Path::new("no_extension")),
            PackageKind::Manifest
        );
    }

    #[test]
    fn test_manifest_paths_per_kind() {
        assert_eq!(PackageKind::Apk.manifest_path(), Some(APK_MANIFEST_PATH));
        assert_eq!(
            PackageKind::Bundle.manifest_path(),
            Some(BUNDLE_MANIFEST_PATH)
        );
        assert_eq!(PackageKind::Manifest.manifest_path(), None);
    }

    #[test]
    fn test_patch_bare_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AndroidManifest.xml");
        std::fs::write(&path, sample_manifest_bytes()).unwrap();

        let request = PatchRequest::new().version_code(42);
        let outcome = patch_path(&path, &request).unwrap();

        assert_eq!(outcome.kind, PackageKind::Manifest);
        assert_eq!(outcome.changes.len(), 1);

        let document = Document::decode(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(document.root.attributes[1].value, "42");
        assert_eq!(
            document.root.attributes[1].compiled,
            Some(CompiledValue::IntDecimal(42))
        );
    }

    #[test]
    fn test_patch_bundle_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.aab");
        let manifest = sample_manifest_bytes();
        let zip = build_zip(&[
            ZipSpec::deflated("base/dex/classes.dex", b"dex dex dex dex"),
            ZipSpec::deflated(BUNDLE_MANIFEST_PATH, &manifest),
            ZipSpec::stored("base/resources.pb", b"resources"),
        ]);
        std::fs::write(&path, zip).unwrap();

        let request = PatchRequest::new().version_code(42).package("com.example.new");
        let outcome = patch_path(&path, &request).unwrap();
        assert_eq!(outcome.kind, PackageKind::Bundle);
        assert_eq!(outcome.changes.len(), 2);

        let archive = Archive::open_path(&path).unwrap();
        let document = Document::decode(&archive.extract(BUNDLE_MANIFEST_PATH).unwrap()).unwrap();
        assert_eq!(document.root.attributes[0].value, "com.example.new");
        assert_eq!(document.root.attributes[1].value, "42");
        assert_eq!(archive.extract("base/dex/classes.dex").unwrap(), b"dex dex dex dex");
        assert_eq!(archive.extract("base/resources.pb").unwrap(), b"resources");
    }

    #[test]
    fn test_patch_bundle_missing_manifest_leaves_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.aab");
        let zip = build_zip(&[ZipSpec::stored("base/resources.pb", b"resources")]);
        std::fs::write(&path, &zip).unwrap();

        let err = patch_path(&path, &PatchRequest::new().version_code(1)).unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
        // The original artifact is untouched on failure.
        assert_eq!(std::fs::read(&path).unwrap(), zip);
    }

    #[test]
    fn test_patch_garbage_manifest_leaves_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bin");
        std::fs::write(&path, b"\xFF\xFF\xFF not a manifest").unwrap();

        let err = patch_path(&path, &PatchRequest::new().version_code(1)).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"\xFF\xFF\xFF not a manifest");
    }

    #[test]
    fn test_unset_request_roundtrips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AndroidManifest.xml");
        let original = sample_manifest_bytes();
        std::fs::write(&path, &original).unwrap();

        let outcome = patch_path(&path, &PatchRequest::new()).unwrap();
        assert!(outcome.changes.is_empty());
        // Canonically encoded input survives an all-unset pass byte for byte.
        assert_eq!(std::fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_staging_dir_for_bare_filename() {
        assert_eq!(staging_dir(Path::new("file.aab")), Path::new("."));
        assert_eq!(staging_dir(Path::new("/tmp/file.aab")), Path::new("/tmp"));
    }
}
