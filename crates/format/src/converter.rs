//! Converts byte payloads between the three RDF serializations this pod
//! understands, via the minimal triple model in [`crate::triple`].

use ldp_core::{is_rdf_format, normalize_content_type, ErrorKind, PodError, PodResult};
use serde_json::{json, Value};

use crate::triple::{ObjectTerm, Triple, DCTERMS_TITLE, LDP_BASIC_CONTAINER, LDP_CONTAINS, RDF_TYPE};

const DEFAULT_VOCAB: &str = "http://schema.org/";
const RESOURCE_SUBJECT: &str = "";

/// Stateless RDF format converter.
pub struct FormatConverter;

impl FormatConverter {
    /// Whether `content_type` (after normalization) is a supported RDF format.
    pub fn validate_format(content_type: &str) -> bool {
        is_rdf_format(&normalize_content_type(content_type))
    }

    /// Convert `data` from one RDF serialization to another.
    pub fn convert(data: &[u8], from_format: &str, to_format: &str) -> PodResult<Vec<u8>> {
        let from = normalize_content_type(from_format);
        let to = normalize_content_type(to_format);

        if from == to {
            return Ok(data.to_vec());
        }
        if !is_rdf_format(&from) || !is_rdf_format(&to) {
            return Err(PodError::new(
                ErrorKind::FormatConversionFailed,
                "FormatConverter::convert",
                format!("unsupported conversion from {from} to {to}"),
            ));
        }

        let triples = parse(data, &from)?;
        serialize(&triples, &to)
    }

    /// Render a container as an LDP BasicContainer document in `format`.
    pub fn render_container(
        format: &str,
        base_uri: &str,
        container_id: &str,
        title: Option<&str>,
        member_ids: &[String],
    ) -> PodResult<Vec<u8>> {
        let format = normalize_content_type(format);
        if !is_rdf_format(&format) {
            return Err(PodError::new(
                ErrorKind::UnsupportedFormat,
                "FormatConverter::render_container",
                format!("unsupported format: {format}"),
            ));
        }

        let subject = format!("{base_uri}{container_id}");
        let mut triples = vec![Triple::new(subject.clone(), RDF_TYPE, ObjectTerm::iri(LDP_BASIC_CONTAINER))];
        if let Some(title) = title {
            triples.push(Triple::new(subject.clone(), DCTERMS_TITLE, ObjectTerm::literal(title)));
        }
        for member in member_ids {
            triples.push(Triple::new(
                subject.clone(),
                LDP_CONTAINS,
                ObjectTerm::iri(format!("{base_uri}{member}")),
            ));
        }

        serialize(&triples, &format)
    }
}

fn parse(data: &[u8], format: &str) -> PodResult<Vec<Triple>> {
    match format {
        "application/ld+json" => parse_json_ld(data),
        "text/turtle" => parse_turtle(data),
        "application/rdf+xml" => parse_rdf_xml(data),
        _ => unreachable!("checked by is_rdf_format before calling parse"),
    }
}

fn serialize(triples: &[Triple], format: &str) -> PodResult<Vec<u8>> {
    match format {
        "application/ld+json" => Ok(serialize_json_ld(triples)),
        "text/turtle" => Ok(serialize_turtle(triples)),
        "application/rdf+xml" => Ok(serialize_rdf_xml(triples)),
        _ => unreachable!("checked by is_rdf_format before calling serialize"),
    }
}

fn conversion_error(message: impl Into<String>) -> PodError {
    PodError::new(ErrorKind::FormatConversionFailed, "FormatConverter", message.into())
}

// -- JSON-LD -----------------------------------------------------------

fn parse_json_ld(data: &[u8]) -> PodResult<Vec<Triple>> {
    let value: Value = serde_json::from_slice(data).map_err(|e| conversion_error(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| conversion_error("JSON-LD document must be a top-level object"))?;

    let vocab = object
        .get("@context")
        .and_then(Value::as_str)
        .map(|ctx| if ctx.ends_with('/') || ctx.ends_with('#') { ctx.to_string() } else { format!("{ctx}/") })
        .unwrap_or_else(|| DEFAULT_VOCAB.to_string());

    let subject = object
        .get("@id")
        .and_then(Value::as_str)
        .unwrap_or(RESOURCE_SUBJECT)
        .to_string();

    let mut triples = Vec::new();
    if let Some(type_name) = object.get("@type").and_then(Value::as_str) {
        triples.push(Triple::new(subject.clone(), RDF_TYPE, ObjectTerm::iri(format!("{vocab}{type_name}"))));
    }

    for (key, val) in object {
        if key.starts_with('@') {
            continue;
        }
        let predicate = format!("{vocab}{key}");
        match val {
            Value::String(s) => triples.push(Triple::new(subject.clone(), predicate, ObjectTerm::literal(s))),
            Value::Array(items) => {
                for item in items {
                    if let Value::String(s) = item {
                        triples.push(Triple::new(subject.clone(), predicate.clone(), ObjectTerm::literal(s)));
                    }
                }
            }
            other => triples.push(Triple::new(subject.clone(), predicate, ObjectTerm::literal(other.to_string()))),
        }
    }

    Ok(triples)
}

fn serialize_json_ld(triples: &[Triple]) -> Vec<u8> {
    let mut doc = serde_json::Map::new();
    doc.insert("@context".to_string(), json!(DEFAULT_VOCAB.trim_end_matches('/')));

    let subject = triples.first().map(|t| t.subject.clone()).unwrap_or_default();
    if !subject.is_empty() {
        doc.insert("@id".to_string(), json!(subject));
    }

    let mut contains = Vec::new();
    for triple in triples {
        let local_name = local_name(&triple.predicate);
        match (triple.predicate.as_str(), &triple.object) {
            (RDF_TYPE, ObjectTerm::Iri(iri)) => {
                doc.insert("@type".to_string(), json!(local_name_of_iri(iri)));
            }
            (LDP_CONTAINS, ObjectTerm::Iri(iri)) => contains.push(json!(iri)),
            (DCTERMS_TITLE, obj) => {
                doc.insert("dcterms:title".to_string(), json!(obj.as_str()));
            }
            _ => {
                doc.insert(local_name, json!(triple.object.as_str()));
            }
        }
    }

    if !contains.is_empty() {
        doc.insert("contains".to_string(), Value::Array(contains));
    }

    serde_json::to_vec_pretty(&Value::Object(doc)).expect("JSON-LD document is always serializable")
}

// -- Turtle --------------------------------------------------------------

fn parse_turtle(data: &[u8]) -> PodResult<Vec<Triple>> {
    let text = std::str::from_utf8(data).map_err(|e| conversion_error(e.to_string()))?;
    let mut triples = Vec::new();
    let mut current_subject: Option<String> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim().trim_end_matches('.').trim();
        if line.is_empty() || line.starts_with('@') || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.splitn(3, char::is_whitespace).collect();
        if parts.len() < 2 {
            continue;
        }

        let (subject, predicate, object) = if parts.len() == 3 && parts[0] != ";" {
            current_subject = Some(strip_angle_brackets(parts[0]));
            (current_subject.clone().unwrap(), parts[1].to_string(), parts[2].to_string())
        } else if let Some(subject) = &current_subject {
            (subject.clone(), parts[0].to_string(), parts.get(1).copied().unwrap_or("").to_string())
        } else {
            continue;
        };

        let predicate = expand_turtle_term(&predicate);
        let object = object.trim().trim_end_matches(';').trim();
        let object_term = if object.starts_with('<') {
            ObjectTerm::iri(strip_angle_brackets(object))
        } else if object.starts_with('"') {
            ObjectTerm::literal(object.trim_matches('"'))
        } else if predicate == RDF_TYPE {
            ObjectTerm::iri(expand_turtle_term(object))
        } else {
            ObjectTerm::literal(expand_turtle_term(object))
        };

        triples.push(Triple::new(subject, predicate, object_term));
    }

    Ok(triples)
}

fn serialize_turtle(triples: &[Triple]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str("@prefix ldp: <http://www.w3.org/ns/ldp#> .\n");
    out.push_str("@prefix dcterms: <http://purl.org/dc/terms/> .\n");
    out.push_str(&format!("@prefix schema: <{DEFAULT_VOCAB}> .\n\n"));

    let subject = triples.first().map(|t| t.subject.clone()).unwrap_or_default();
    out.push_str(&format!("<{subject}>\n"));

    for (idx, triple) in triples.iter().enumerate() {
        let predicate = compact_term(&triple.predicate);
        let object = match &triple.object {
            ObjectTerm::Iri(iri) if triple.predicate == RDF_TYPE => compact_term(iri),
            ObjectTerm::Iri(iri) => format!("<{iri}>"),
            ObjectTerm::Literal { value, .. } => format!("\"{value}\""),
        };
        let predicate = if triple.predicate == RDF_TYPE { "a".to_string() } else { predicate };
        let terminator = if idx + 1 == triples.len() { "." } else { ";" };
        out.push_str(&format!("    {predicate} {object} {terminator}\n"));
    }

    out.into_bytes()
}

// -- RDF/XML ---------------------------------------------------------------

fn parse_rdf_xml(data: &[u8]) -> PodResult<Vec<Triple>> {
    let text = std::str::from_utf8(data).map_err(|e| conversion_error(e.to_string()))?;
    let mut triples = Vec::new();
    let subject = extract_xml_attr(text, "rdf:about").unwrap_or_default();

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("<ldp:contains") {
            if let Some(resource) = extract_attr_value(rest, "rdf:resource") {
                triples.push(Triple::new(subject.clone(), LDP_CONTAINS, ObjectTerm::iri(resource)));
            }
        } else if let Some(rest) = line.strip_prefix("<dcterms:title>") {
            if let Some(end) = rest.find("</dcterms:title>") {
                triples.push(Triple::new(subject.clone(), DCTERMS_TITLE, ObjectTerm::literal(&rest[..end])));
            }
        }
    }

    if text.contains("ldp:BasicContainer") {
        triples.insert(0, Triple::new(subject, RDF_TYPE, ObjectTerm::iri(LDP_BASIC_CONTAINER)));
    }

    Ok(triples)
}

fn serialize_rdf_xml(triples: &[Triple]) -> Vec<u8> {
    let subject = triples.first().map(|t| t.subject.clone()).unwrap_or_default();
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"\n");
    out.push_str("         xmlns:ldp=\"http://www.w3.org/ns/ldp#\"\n");
    out.push_str("         xmlns:dcterms=\"http://purl.org/dc/terms/\">\n");
    out.push_str(&format!("  <rdf:Description rdf:about=\"{subject}\">\n"));

    for triple in triples {
        match (triple.predicate.as_str(), &triple.object) {
            (RDF_TYPE, ObjectTerm::Iri(iri)) if iri == LDP_BASIC_CONTAINER => {
                out.push_str("    <rdf:type rdf:resource=\"http://www.w3.org/ns/ldp#BasicContainer\"/>\n");
            }
            (LDP_CONTAINS, ObjectTerm::Iri(iri)) => {
                out.push_str(&format!("    <ldp:contains rdf:resource=\"{iri}\"/>\n"));
            }
            (DCTERMS_TITLE, obj) => {
                out.push_str(&format!("    <dcterms:title>{}</dcterms:title>\n", obj.as_str()));
            }
            (predicate, obj) => {
                out.push_str(&format!("    <!-- {predicate} -->{}\n", obj.as_str()));
            }
        }
    }

    out.push_str("  </rdf:Description>\n");
    out.push_str("</rdf:RDF>\n");
    out.into_bytes()
}

// -- helpers ---------------------------------------------------------------

fn strip_angle_brackets(s: &str) -> String {
    s.trim_start_matches('<').trim_end_matches('>').to_string()
}

fn local_name(iri: &str) -> String {
    iri.rsplit(['/', '#']).next().unwrap_or(iri).to_string()
}

fn local_name_of_iri(iri: &str) -> String {
    local_name(iri)
}

fn compact_term(iri: &str) -> String {
    if let Some(rest) = iri.strip_prefix("http://www.w3.org/ns/ldp#") {
        format!("ldp:{rest}")
    } else if let Some(rest) = iri.strip_prefix("http://purl.org/dc/terms/") {
        format!("dcterms:{rest}")
    } else if let Some(rest) = iri.strip_prefix(DEFAULT_VOCAB) {
        format!("schema:{rest}")
    } else {
        format!("<{iri}>")
    }
}

fn expand_turtle_term(term: &str) -> String {
    if let Some(rest) = term.strip_prefix("ldp:") {
        format!("http://www.w3.org/ns/ldp#{rest}")
    } else if let Some(rest) = term.strip_prefix("dcterms:") {
        format!("http://purl.org/dc/terms/{rest}")
    } else if let Some(rest) = term.strip_prefix("schema:") {
        format!("{DEFAULT_VOCAB}{rest}")
    } else {
        term.to_string()
    }
}

fn extract_xml_attr(text: &str, attr: &str) -> Option<String> {
    text.lines().find_map(|line| extract_attr_value(line, attr))
}

fn extract_attr_value(line: &str, attr: &str) -> Option<String> {
    let needle = format!("{attr}=\"");
    let start = line.find(&needle)? + needle.len();
    let end = line[start..].find('"')? + start;
    Some(line[start..end].to_string())
}
