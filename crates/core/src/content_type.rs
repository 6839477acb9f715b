//! Media-type normalization shared by every crate that accepts a content type.

/// Normalize a media type to its canonical form.
///
/// Case-insensitive, trimmed, with recognized RDF aliases folded to their
/// canonical IANA media type. Unrecognized types pass through unchanged
/// (lowercased and trimmed).
pub fn normalize_content_type(content_type: &str) -> String {
    let trimmed = content_type.trim().to_ascii_lowercase();
    match trimmed.as_str() {
        "json-ld" | "jsonld" | "application/json" => "application/ld+json".to_string(),
        "turtle" | "ttl" => "text/turtle".to_string(),
        "rdf/xml" | "rdfxml" | "xml" => "application/rdf+xml".to_string(),
        _ => trimmed,
    }
}

/// Whether a normalized content type is one of the three RDF serializations
/// this pod understands.
pub fn is_rdf_format(content_type: &str) -> bool {
    matches!(
        content_type,
        "application/ld+json" | "text/turtle" | "application/rdf+xml"
    )
}

/// Whether a media type reads as *some* RDF serialization, including ones
/// this pod does not implement a converter for (N-Triples, N3, TriG, ...).
/// Broader than [`is_rdf_format`]: used to distinguish "this is RDF we don't
/// support" (`UnsupportedFormat`) from "this isn't RDF at all" (stored as an
/// opaque byte payload).
pub fn looks_like_rdf(content_type: &str) -> bool {
    if is_rdf_format(&normalize_content_type(content_type)) {
        return true;
    }
    let lowered = content_type.trim().to_ascii_lowercase();
    lowered.contains("rdf")
        || lowered.contains("turtle")
        || lowered.contains("n-triples")
        || lowered.contains("ntriples")
        || lowered.contains("n-quads")
        || lowered.contains("trig")
        || lowered == "text/n3"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_normalize_to_canonical_types() {
        assert_eq!(normalize_content_type("JSON-LD"), "application/ld+json");
        assert_eq!(normalize_content_type("ttl"), "text/turtle");
        assert_eq!(normalize_content_type(" XML "), "application/rdf+xml");
    }

    #[test]
    fn unrecognized_types_pass_through_lowercased() {
        assert_eq!(normalize_content_type("Text/Plain"), "text/plain");
    }

    #[test]
    fn rdf_format_detection() {
        assert!(is_rdf_format("text/turtle"));
        assert!(!is_rdf_format("text/plain"));
    }

    #[test]
    fn looks_like_rdf_catches_unsupported_serializations() {
        assert!(looks_like_rdf("application/n-triples"));
        assert!(looks_like_rdf("application/trig"));
        assert!(!looks_like_rdf("text/plain"));
    }

    #[test]
    fn looks_like_rdf_accepts_supported_aliases() {
        assert!(looks_like_rdf("json-ld"));
        assert!(looks_like_rdf(&normalize_content_type("turtle")));
    }
}
