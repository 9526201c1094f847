//! `extracted_text`: full text of the pages in sequence order
//!
//! Each page contributes the first of its files that holds text: HTML is
//! reduced to its text content, plain text is used as is. The page texts
//! are joined with a single space into `content__dps_txt`.

use crate::sequence::PageSequence;
use quarry_core::{Fields, PipelineContext, StageError};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("valid regex")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextKind {
    Html,
    Plain,
}

impl TextKind {
    fn from_mime_type(mime_type: &str) -> Option<Self> {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        match essence {
            "text/html" => Some(Self::Html),
            "text/plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([xX][0-9a-fA-F]{1,6}|[0-9]{1,7})|([a-zA-Z][a-zA-Z0-9]{1,7}));").expect("valid regex")
});

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", ' '),
    ("shy", '\u{ad}'),
    ("copy", '©'),
    ("reg", '®'),
    ("deg", '°'),
    ("sect", '§'),
    ("para", '¶'),
    ("middot", '·'),
    ("laquo", '«'),
    ("raquo", '»'),
    ("iexcl", '¡'),
    ("iquest", '¿'),
    ("szlig", 'ß'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("lsquo", '‘'),
    ("rsquo", '’'),
    ("sbquo", '‚'),
    ("ldquo", '“'),
    ("rdquo", '”'),
    ("bdquo", '„'),
    ("hellip", '…'),
    ("bull", '•'),
    ("dagger", '†'),
    ("trade", '™'),
    ("euro", '€'),
    ("pound", '£'),
    ("cent", '¢'),
    ("yen", '¥'),
    ("times", '×'),
    ("divide", '÷'),
    ("Agrave", 'À'), ("Aacute", 'Á'), ("Acirc", 'Â'), ("Atilde", 'Ã'), ("Auml", 'Ä'), ("Aring", 'Å'),
    ("AElig", 'Æ'), ("Ccedil", 'Ç'),
    ("Egrave", 'È'), ("Eacute", 'É'), ("Ecirc", 'Ê'), ("Euml", 'Ë'),
    ("Igrave", 'Ì'), ("Iacute", 'Í'), ("Icirc", 'Î'), ("Iuml", 'Ï'),
    ("Ntilde", 'Ñ'),
    ("Ograve", 'Ò'), ("Oacute", 'Ó'), ("Ocirc", 'Ô'), ("Otilde", 'Õ'), ("Ouml", 'Ö'), ("Oslash", 'Ø'),
    ("Ugrave", 'Ù'), ("Uacute", 'Ú'), ("Ucirc", 'Û'), ("Uuml", 'Ü'), ("Yacute", 'Ý'),
    ("agrave", 'à'), ("aacute", 'á'), ("acirc", 'â'), ("atilde", 'ã'), ("auml", 'ä'), ("aring", 'å'),
    ("aelig", 'æ'), ("ccedil", 'ç'),
    ("egrave", 'è'), ("eacute", 'é'), ("ecirc", 'ê'), ("euml", 'ë'),
    ("igrave", 'ì'), ("iacute", 'í'), ("icirc", 'î'), ("iuml", 'ï'),
    ("ntilde", 'ñ'),
    ("ograve", 'ò'), ("oacute", 'ó'), ("ocirc", 'ô'), ("otilde", 'õ'), ("ouml", 'ö'), ("oslash", 'ø'),
    ("ugrave", 'ù'), ("uacute", 'ú'), ("ucirc", 'û'), ("uuml", 'ü'), ("yacute", 'ý'), ("yuml", 'ÿ'),
];

/// Decode character references in one pass; unknown names and invalid
/// code points are left as written
fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let decoded = match (caps.get(1), caps.get(2)) {
                (Some(number), _) => {
                    let number = number.as_str();
                    let code = match number.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => number.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
                (None, Some(name)) => NAMED_ENTITIES
                    .iter()
                    .find(|(entity, _)| *entity == name.as_str())
                    .map(|(_, c)| *c),
                (None, None) => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Text content of an HTML document
pub fn html_text(html: &str) -> String {
    let without_scripts = SCRIPT.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_scripts, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// The first text file of a page document
fn text_file(page: &Value) -> Option<(&str, TextKind)> {
    page.get("page__has_file")?
        .as_array()?
        .iter()
        .find_map(|file| {
            let kind = file
                .get("file__mime_type__txt")
                .and_then(Value::as_str)
                .and_then(TextKind::from_mime_type)?;
            let id = file.get("id").and_then(Value::as_str)?;
            Some((id, kind))
        })
}

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let pages = PageSequence::from_doc(ctx.doc, &ctx.prefix());
    if pages.is_empty() {
        return Ok(Fields::new());
    }

    let mut texts = Vec::new();
    for (uri, page) in pages.uris().iter().zip(pages.pages()) {
        let Some((file, kind)) = page.and_then(text_file) else {
            debug!("Page {uri} has no text file");
            continue;
        };
        let bytes = ctx.fetch_binary(file).await?;
        let body = String::from_utf8_lossy(&bytes);
        let text = match kind {
            TextKind::Html => html_text(&body),
            TextKind::Plain => body.trim().to_string(),
        };
        if text.is_empty() {
            warn!("Text file {file} of page {uri} is empty");
            continue;
        }
        texts.push(text);
    }

    if texts.is_empty() {
        return Ok(Fields::new());
    }
    Ok(Fields::from([(
        "content__dps_txt".to_string(),
        Value::from(texts.join(" ")),
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_html_text() {
        let html = "<html><head><style>p { color: red }</style></head>\
                    <body><p>Terrapins &amp; turtles</p>\n<p>win</p></body></html>";
        assert_eq!(html_text(html), "Terrapins & turtles win");
    }

    #[test]
    fn test_character_references() {
        assert_eq!(
            html_text("<p>Maryland&#8217;s caf&eacute; &#x2019;20 &mdash; &AElig;</p>"),
            "Maryland\u{2019}s caf\u{e9} \u{2019}20 \u{2014} \u{c6}"
        );
        assert_eq!(html_text("&amp;lt; &bogus; &#xD800;"), "&lt; &bogus; &#xD800;");
    }

    #[test]
    fn test_text_file_picks_first_text_mime_type() {
        let page = json!({
            "id": "r/page1",
            "page__has_file": [
                {"id": "r/page1/image", "file__mime_type__txt": "image/tiff"},
                {"id": "r/page1/ocr", "file__mime_type__txt": "text/html; charset=utf-8"}
            ]
        });
        assert_eq!(text_file(&page), Some(("r/page1/ocr", TextKind::Html)));
        assert_eq!(text_file(&json!({"id": "r/page2"})), None);
    }
}
