//! IIIF identifiers and URL templates

use quarry_config::IiifConfig;

/// Build a IIIF identifier from a repository path: drop the leading `/`,
/// turn the remaining slashes into colons and prepend `prefix`.
///
/// ```
/// use quarry_core::iiif::iiif_identifier;
///
/// assert_eq!(iiif_identifier("/foo/bar", ""), "foo:bar");
/// assert_eq!(iiif_identifier("/foo/bar", "fcrepo:"), "fcrepo:foo:bar");
/// ```
pub fn iiif_identifier(repo_path: &str, prefix: &str) -> String {
    format!(
        "{prefix}{}",
        repo_path.trim_start_matches('/').replace('/', ":")
    )
}

/// Expand the single `{+id}` or `{id}` placeholder in `template`.
///
/// `{+id}` inserts the value verbatim; `{id}` percent-encodes it.
pub fn expand_template(template: &str, id: &str) -> String {
    if template.contains("{+id}") {
        template.replacen("{+id}", id, 1)
    } else {
        template.replacen("{id}", &urlencoding::encode(id), 1)
    }
}

/// IIIF link builder configured once per process
#[derive(Debug, Clone, Default)]
pub struct IiifLinks {
    prefix: String,
    manifest_template: String,
    thumbnail_template: String,
}

impl IiifLinks {
    pub fn new(
        prefix: impl Into<String>,
        manifest_template: impl Into<String>,
        thumbnail_template: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            manifest_template: manifest_template.into(),
            thumbnail_template: thumbnail_template.into(),
        }
    }

    /// Templates are validated when the config is loaded
    pub fn from_config(config: &IiifConfig) -> Self {
        Self::new(
            &config.identifier_prefix,
            &config.manifest_url_pattern,
            &config.thumbnail_url_pattern,
        )
    }

    pub fn is_configured(&self) -> bool {
        !self.manifest_template.is_empty() && !self.thumbnail_template.is_empty()
    }

    pub fn identifier(&self, repo_path: &str) -> String {
        iiif_identifier(repo_path, &self.prefix)
    }

    pub fn manifest_url(&self, id: &str) -> String {
        expand_template(&self.manifest_template, id)
    }

    pub fn thumbnail_url(&self, id: &str) -> String {
        expand_template(&self.thumbnail_template, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_prefix() {
        assert_eq!(iiif_identifier("/foo/bar", "fcrepo:"), "fcrepo:foo:bar");
        assert_eq!(iiif_identifier("foo", ""), "foo");
    }

    #[test]
    fn test_reserved_expansion_is_verbatim() {
        let links = IiifLinks::new(
            "fcrepo:",
            "https://iiif/manifests/{+id}/manifest",
            "https://iiif/images/{+id}/full/!100,100/0/default.jpg",
        );
        let id = links.identifier("/dc/2021/1/ab");
        assert_eq!(
            links.manifest_url(&id),
            "https://iiif/manifests/fcrepo:dc:2021:1:ab/manifest"
        );
        assert!(links.is_configured());
    }

    #[test]
    fn test_simple_expansion_encodes() {
        let links = IiifLinks::new("", "https://iiif/m/{id}", "https://iiif/t/{id}");
        assert_eq!(links.thumbnail_url("fcrepo:a/b"), "https://iiif/t/fcrepo%3Aa%2Fb");
    }

    #[test]
    fn test_from_config() {
        let config = IiifConfig {
            identifier_prefix: "x:".to_string(),
            manifest_url_pattern: String::new(),
            thumbnail_url_pattern: String::new(),
        };
        let links = IiifLinks::from_config(&config);
        assert!(!links.is_configured());
        assert_eq!(links.identifier("/a/b"), "x:a:b");
    }
}
