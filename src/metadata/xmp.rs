//! Minimal XMP packet reader.
//!
//! Only flat properties are collected: `prefix:Name="value"` attributes and
//! `<prefix:Name>value</prefix:Name>` simple elements. Structures, arrays and
//! language alternatives are ignored. Prefixes are resolved through their
//! `xmlns` bindings, so a property is reported under its canonical prefix no
//! matter which prefix the writer declared for the namespace.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::debug;

const PACKET_START: &[u8] = b"<x:xmpmeta";
const PACKET_END: &[u8] = b"</x:xmpmeta>";

/// Namespaces that describe the packet itself rather than photo properties
const STRUCTURAL_NAMESPACES: &[&str] = &[
    "adobe:ns:meta/",
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
    "http://www.w3.org/XML/1998/namespace",
    "http://www.w3.org/2000/xmlns/",
];

/// Literal prefixes treated as structural when they are not bound
const STRUCTURAL_PREFIXES: &[&str] = &["x", "rdf", "xmlns", "xml"];

/// Canonical prefixes for the namespaces that carry location data
const KNOWN_NAMESPACES: &[(&str, &str)] = &[
    ("http://ns.adobe.com/exif/1.0/", "exif"),
    ("http://cipa.jp/exif/1.0/", "exifEX"),
    ("http://ns.adobe.com/tiff/1.0/", "tiff"),
    ("http://www.w3.org/2003/01/geo/wgs84_pos#", "geo"),
    ("http://www.dji.com/drone-dji/1.0/", "drone-dji"),
    ("http://pix4d.com/camera/1.0/", "Camera"),
];

/// A flat XMP property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmpProperty {
    pub prefix: String,
    pub name: String,
    pub value: String,
}

/// Locate the XMP packet inside arbitrary container bytes.
pub fn find_packet(bytes: &[u8]) -> Option<String> {
    let start = find(bytes, PACKET_START)?;
    let end = find(&bytes[start..], PACKET_END)? + start + PACKET_END.len();
    Some(String::from_utf8_lossy(&bytes[start..end]).into_owned())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Element currently open in the packet
struct OpenElement {
    prefix: Option<String>,
    name: String,
    text: String,
    has_children: bool,
}

/// Collect flat properties from an XMP packet, in document order.
///
/// Malformed XML stops the scan; whatever was collected before the error is
/// still returned.
pub fn parse_properties(packet: &str) -> Vec<XmpProperty> {
    let mut reader = NsReader::from_str(packet);
    let mut properties = Vec::new();
    let mut open: Vec<OpenElement> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                if let Some(parent) = open.last_mut() {
                    parent.has_children = true;
                }
                collect_attributes(&reader, &element, &mut properties);
                let (prefix, name) = resolve_element(&reader, element.name());
                open.push(OpenElement {
                    prefix,
                    name,
                    text: String::new(),
                    has_children: false,
                });
            }
            Ok(Event::Empty(element)) => {
                if let Some(parent) = open.last_mut() {
                    parent.has_children = true;
                }
                collect_attributes(&reader, &element, &mut properties);
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = open.last_mut() {
                    match text.unescape() {
                        Ok(value) => current.text.push_str(&value),
                        Err(e) => {
                            debug!("Undecodable XMP text: {}", e);
                            break;
                        }
                    }
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::End(_)) => {
                let Some(closed) = open.pop() else {
                    continue;
                };
                let value = closed.text.trim();
                if closed.has_children || value.is_empty() {
                    continue;
                }
                if let Some(prefix) = closed.prefix {
                    properties.push(XmpProperty {
                        prefix,
                        name: closed.name,
                        value: value.to_string(),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Malformed XMP packet: {}", e);
                break;
            }
        }
    }

    properties
}

fn collect_attributes(
    reader: &NsReader<&[u8]>,
    element: &BytesStart<'_>,
    properties: &mut Vec<XmpProperty>,
) {
    for attribute in element.attributes() {
        let attribute = match attribute {
            Ok(attribute) => attribute,
            Err(e) => {
                debug!("Skipping malformed XMP attribute: {}", e);
                continue;
            }
        };
        // Namespace declarations
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attribute.key);
        let Some(prefix) = canonical_prefix(resolved, attribute.key) else {
            continue;
        };
        let value = match attribute.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(e) => {
                debug!("Undecodable XMP attribute value: {}", e);
                continue;
            }
        };
        properties.push(XmpProperty {
            prefix,
            name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value,
        });
    }
}

fn resolve_element(reader: &NsReader<&[u8]>, qname: QName<'_>) -> (Option<String>, String) {
    let (resolved, local) = reader.resolve_element(qname);
    let prefix = canonical_prefix(resolved, qname);
    (prefix, String::from_utf8_lossy(local.as_ref()).into_owned())
}

/// Map a resolved namespace to the prefix properties are reported under.
/// Unknown namespaces and undeclared prefixes keep the literal prefix.
fn canonical_prefix(resolved: ResolveResult<'_>, qname: QName<'_>) -> Option<String> {
    let literal = qname
        .prefix()
        .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned());

    match resolved {
        ResolveResult::Bound(Namespace(uri)) => {
            let uri = String::from_utf8_lossy(uri);
            if STRUCTURAL_NAMESPACES.contains(&uri.as_ref()) {
                return None;
            }
            KNOWN_NAMESPACES
                .iter()
                .find(|(known, _)| *known == uri)
                .map(|(_, prefix)| prefix.to_string())
                .or(literal)
        }
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(_) => {
            literal.filter(|prefix| !STRUCTURAL_PREFIXES.contains(&prefix.as_str()))
        }
    }
}

/// Parse an XMP GPSCoordinate string: `DDD,MM,SSk` or `DDD,MM.mmk`, where
/// `k` is the hemisphere letter. Returns the components and the hemisphere.
pub fn parse_gps_coordinate(value: &str) -> Option<(Vec<f64>, Option<char>)> {
    let value = value.trim();
    let last = value.chars().last()?;

    let (body, hemisphere) = if last.is_ascii_alphabetic() {
        let hemisphere = last.to_ascii_uppercase();
        if !matches!(hemisphere, 'N' | 'S' | 'E' | 'W') {
            return None;
        }
        (&value[..value.len() - 1], Some(hemisphere))
    } else {
        (value, None)
    };

    let components: Option<Vec<f64>> = body
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect();
    let components = components?;

    if components.is_empty() || components.len() > 3 {
        return None;
    }

    Some((components, hemisphere))
}
