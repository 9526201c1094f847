//! `Link` header parsing

/// Targets of `Link` header entries with the given `rel`
pub fn links_with_rel<'a>(header: &'a str, rel: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    header.split(',').filter_map(move |entry| {
        let mut parts = entry.split(';').map(str::trim);
        let target = parts.next()?.strip_prefix('<')?.strip_suffix('>')?;
        parts
            .filter_map(|param| param.split_once('='))
            .any(|(key, value)| {
                key.trim().eq_ignore_ascii_case("rel")
                    && value
                        .trim()
                        .trim_matches('"')
                        .split_ascii_whitespace()
                        .any(|r| r.eq_ignore_ascii_case(rel))
            })
            .then_some(target)
    })
}

/// The `describedby` target among one or more `Link` header values
pub fn described_by<'a, I>(headers: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    headers
        .into_iter()
        .find_map(|h| links_with_rel(h, "describedby").next())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_described_by_among_several() {
        let header = r#"<http://www.w3.org/ns/ldp#NonRDFSource>;rel="type", <http://repo/rest/a/b/fcr:metadata>; rel="describedby""#;
        assert_eq!(
            described_by([header]),
            Some("http://repo/rest/a/b/fcr:metadata".to_string())
        );
    }

    #[test]
    fn test_no_described_by() {
        assert_eq!(
            described_by([r#"<http://www.w3.org/ns/ldp#Resource>;rel="type""#]),
            None
        );
        assert_eq!(described_by(["garbage"]), None);
    }

    #[test]
    fn test_multiple_rel_values() {
        let header = r#"<http://repo/desc>; rel="alternate describedby""#;
        assert_eq!(links_with_rel(header, "describedby").collect::<Vec<_>>(), vec!["http://repo/desc"]);
    }
}
