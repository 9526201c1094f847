//! RDF vocabulary constants and CURIE shortening

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const PCDM: &str = "http://pcdm.org/models#";
pub const PCDMUSE: &str = "http://pcdm.org/use#";
pub const ORE: &str = "http://www.openarchives.org/ore/terms/";
pub const IANA: &str = "http://www.iana.org/assignments/relation/";
pub const FABIO: &str = "http://purl.org/spar/fabio/";
pub const BIBO: &str = "http://purl.org/ontology/bibo/";
pub const EDM: &str = "http://www.europeana.eu/schemas/edm/";
pub const EBUCORE: &str = "http://www.ebu.ch/metadata/ontologies/ebucore/ebucore#";
pub const SCHEMA: &str = "http://schema.org/";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
pub const LDP: &str = "http://www.w3.org/ns/ldp#";
pub const FEDORA: &str = "http://fedora.info/definitions/v4/repository#";
pub const UMD: &str = "http://vocab.lib.umd.edu/model#";
pub const UMDTYPE: &str = "http://vocab.lib.umd.edu/datatype#";
pub const UMDACCESS: &str = "http://vocab.lib.umd.edu/access#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

pub const UMDACCESS_PUBLISHED: &str = "http://vocab.lib.umd.edu/access#Published";
pub const UMDACCESS_HIDDEN: &str = "http://vocab.lib.umd.edu/access#Hidden";
pub const UMDTYPE_HANDLE: &str = "http://vocab.lib.umd.edu/datatype#handle";
pub const UMDTYPE_ACCESSION_NUMBER: &str = "http://vocab.lib.umd.edu/datatype#accessionNumber";

/// Known prefixes, used for CURIE generation. Longer namespaces that share
/// a stem with shorter ones must come first.
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("xsd", XSD),
    ("owl", OWL),
    ("dcterms", DCTERMS),
    ("dc", DC),
    ("pcdmuse", PCDMUSE),
    ("pcdm", PCDM),
    ("ore", ORE),
    ("iana", IANA),
    ("fabio", FABIO),
    ("bibo", BIBO),
    ("edm", EDM),
    ("ebucore", EBUCORE),
    ("schema", SCHEMA),
    ("foaf", FOAF),
    ("ldp", LDP),
    ("fedora", FEDORA),
    ("umd", UMD),
    ("umdtype", UMDTYPE),
    ("umdaccess", UMDACCESS),
];

/// Shorten `uri` to a CURIE using [`PREFIXES`]. URIs outside every known
/// namespace, or whose local part is empty, are returned unchanged.
pub fn shorten_uri(uri: &str) -> String {
    PREFIXES
        .iter()
        .find_map(|(prefix, ns)| {
            uri.strip_prefix(ns)
                .filter(|local| !local.is_empty() && !local.contains(['/', '#']))
                .map(|local| format!("{prefix}:{local}"))
        })
        .unwrap_or_else(|| uri.to_string())
}

/// The part of a URI after its last `#` or `/`
pub fn local_name(uri: &str) -> &str {
    uri.rsplit(['#', '/']).next().unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_known_namespaces() {
        assert_eq!(shorten_uri("http://purl.org/dc/terms/title"), "dcterms:title");
        assert_eq!(shorten_uri("http://pcdm.org/use#ExtractedText"), "pcdmuse:ExtractedText");
        assert_eq!(shorten_uri(UMDACCESS_PUBLISHED), "umdaccess:Published");
    }

    #[test]
    fn test_shorten_unknown_uri_unchanged() {
        assert_eq!(shorten_uri("http://example.com/foo"), "http://example.com/foo");
        assert_eq!(shorten_uri(DCTERMS), DCTERMS);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("http://purl.org/dc/terms/isPartOf"), "isPartOf");
        assert_eq!(local_name("http://pcdm.org/models#hasMember"), "hasMember");
    }
}
