//! Attribute overrides for the root manifest element.
//!
//! A [`PatchRequest`] is a best-effort overlay: each requested override is
//! applied where its target attribute exists and silently skipped where it
//! does not (a warning is logged so schema mismatches remain diagnosable).
//! Only the root element's attribute list is touched; child elements pass
//! through unmodified.

use std::fmt;

use crate::manifest::{CompiledValue, Document};

/// The resource namespace URI qualifying `versionCode` and `versionName`.
pub const ANDROID_NAMESPACE: &str = "http://schemas.android.com/apk/res/android";

const PACKAGE_ATTR: &str = "package";
const VERSION_CODE_ATTR: &str = "versionCode";
const VERSION_NAME_ATTR: &str = "versionName";

/// The overrides to apply to a manifest.
///
/// Constructed once per invocation and read-only thereafter. Every field
/// is optional; the default request changes nothing.
///
/// # Example
///
/// ```rust
/// use apkbump::PatchRequest;
///
/// let request = PatchRequest::new()
///     .version_code(42)
///     .version_name("2.0.1")
///     .package("com.example.new");
/// assert!(!request.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchRequest {
    package: String,
    version_code: u32,
    version_name: String,
}

impl PatchRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the package name override. Empty means unset.
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Sets the version code override. Zero means unset.
    ///
    /// The code must fit a signed 32-bit integer; the CLI enforces the
    /// range before constructing a request.
    pub fn version_code(mut self, code: u32) -> Self {
        self.version_code = code;
        self
    }

    /// Sets the version name override. Empty means unset.
    pub fn version_name(mut self, name: impl Into<String>) -> Self {
        self.version_name = name.into();
        self
    }

    /// Returns `true` if no override is set.
    pub fn is_empty(&self) -> bool {
        self.package.is_empty() && self.version_code == 0 && self.version_name.is_empty()
    }

    /// Applies the overrides to the document's root element.
    ///
    /// Returns one [`AppliedChange`] per attribute that matched an active
    /// override, carrying the old and new renderings for reporting. For
    /// `versionCode` the typed decimal value and the redundant string value
    /// are updated independently: converted manifests drop the string form
    /// while bundles carry both, and the absence of one never blocks the
    /// other.
    pub fn apply_to(&self, document: &mut Document) -> Vec<AppliedChange> {
        let mut changes = Vec::new();
        let mut package_seen = false;
        let mut version_code_seen = false;
        let mut version_name_seen = false;

        for attr in &mut document.root.attributes {
            if attr.is("", PACKAGE_ATTR) {
                package_seen = true;
                if !self.package.is_empty() {
                    changes.push(AppliedChange {
                        attribute: PACKAGE_ATTR.into(),
                        old: attr.value.clone(),
                        new: self.package.clone(),
                    });
                    attr.value = self.package.clone();
                }
            }

            if attr.namespace_uri != ANDROID_NAMESPACE {
                continue;
            }
            match attr.name.as_str() {
                VERSION_CODE_ATTR => {
                    if self.version_code == 0 {
                        continue;
                    }
                    let mut old = None;
                    if let Some(CompiledValue::IntDecimal(v)) = &mut attr.compiled {
                        old = Some(v.to_string());
                        *v = self.version_code as i32;
                    }
                    if !attr.value.is_empty() {
                        old.get_or_insert_with(|| attr.value.clone());
                        attr.value = self.version_code.to_string();
                    }
                    match old {
                        Some(old) => {
                            version_code_seen = true;
                            changes.push(AppliedChange {
                                attribute: VERSION_CODE_ATTR.into(),
                                old,
                                new: self.version_code.to_string(),
                            });
                        }
                        None => log::warn!(
                            "versionCode attribute carries neither a decimal value \
                             nor a string value; leaving it untouched"
                        ),
                    }
                }
                VERSION_NAME_ATTR => {
                    if self.version_name.is_empty() {
                        continue;
                    }
                    version_name_seen = true;
                    changes.push(AppliedChange {
                        attribute: VERSION_NAME_ATTR.into(),
                        old: attr.value.clone(),
                        new: self.version_name.clone(),
                    });
                    attr.value = self.version_name.clone();
                }
                _ => {}
            }
        }

        if !self.package.is_empty() && !package_seen {
            log::warn!("package override requested but the manifest has no package attribute");
        }
        if self.version_code > 0 && !version_code_seen {
            log::warn!(
                "versionCode override requested but the manifest has no matching attribute"
            );
        }
        if !self.version_name.is_empty() && !version_name_seen {
            log::warn!(
                "versionName override requested but the manifest has no versionName attribute"
            );
        }

        changes
    }
}

/// One applied override, with its before/after renderings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    /// The attribute's local name.
    pub attribute: String,
    /// The previous rendering of the value.
    pub old: String,
    /// The new rendering of the value.
    pub new: String,
}

impl fmt::Display for AppliedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Changing {} from {} to {}", self.attribute, self.old, self.new)
    }
}
