//! Photo bytes → [`MetadataTree`].

use exif::{Context, In, Value};
use std::io::Cursor;
use tracing::debug;

use super::xmp::{self, XmpProperty};
use super::{MetaValue, MetadataError, MetadataTree};

/// XMP prefixes whose properties mirror top-level EXIF fields
const ROOT_XMP_PREFIXES: &[&str] = &["exif", "exifEX", "tiff"];

/// Read every metadata block we understand from the photo.
///
/// EXIF failures are not fatal as long as an XMP packet is present.
pub fn read_metadata(bytes: &[u8]) -> Result<MetadataTree, MetadataError> {
    let mut tree = MetadataTree::default();

    let exif_result = exif::Reader::new().read_from_container(&mut Cursor::new(bytes));
    let exif_error = match exif_result {
        Ok(exif) => {
            for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
                let Some(value) = convert_value(&field.value) else {
                    continue;
                };
                let key = field.tag.to_string();
                if field.tag.context() == Context::Gps {
                    tree.insert("gps", &key, value);
                } else {
                    tree.insert_root(&key, value);
                }
            }
            None
        }
        Err(e) => {
            debug!("EXIF not readable: {}", e);
            Some(e)
        }
    };

    if let Some(packet) = xmp::find_packet(bytes) {
        let properties = xmp::parse_properties(&packet);
        debug!("XMP packet with {} properties", properties.len());
        for property in &properties {
            apply_xmp_property(&mut tree, property);
        }
    }

    if tree.is_empty() {
        return Err(match exif_error {
            Some(e) => MetadataError::Exif(e),
            None => MetadataError::NotFound,
        });
    }

    Ok(tree)
}

fn convert_value(value: &Value) -> Option<MetaValue> {
    let numbers: Vec<f64> = match value {
        Value::Rational(v) => v.iter().map(|r| r.to_f64()).collect(),
        Value::SRational(v) => v.iter().map(|r| r.to_f64()).collect(),
        Value::Short(v) => v.iter().map(|&n| n as f64).collect(),
        Value::Long(v) => v.iter().map(|&n| n as f64).collect(),
        Value::SShort(v) => v.iter().map(|&n| n as f64).collect(),
        Value::SLong(v) => v.iter().map(|&n| n as f64).collect(),
        Value::Float(v) => v.iter().map(|&n| n as f64).collect(),
        Value::Double(v) => v.clone(),
        Value::Ascii(parts) => {
            let text = parts
                .first()
                .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').trim().to_string())?;
            return Some(MetaValue::Text(text));
        }
        _ => return None,
    };

    match numbers.len() {
        0 => None,
        1 => Some(MetaValue::Number(numbers[0])),
        _ => Some(MetaValue::Components(numbers)),
    }
}

fn apply_xmp_property(tree: &mut MetadataTree, property: &XmpProperty) {
    let prefix = property.prefix.as_str();
    let name = property.name.as_str();

    if ROOT_XMP_PREFIXES.contains(&prefix) {
        if matches!(name, "GPSLatitude" | "GPSLongitude") {
            if let Some((components, hemisphere)) = xmp::parse_gps_coordinate(&property.value) {
                tree.insert_root(name, MetaValue::Components(components));
                if let Some(h) = hemisphere {
                    tree.insert_root(&format!("{}Ref", name), MetaValue::Text(h.to_string()));
                }
            }
            return;
        }
        tree.insert_root(name, xmp_value(&property.value));
        return;
    }

    // W3C basic geo vocabulary carries plain decimals
    if prefix == "geo" {
        match name {
            "lat" => tree.insert_root("latitude", xmp_value(&property.value)),
            "long" | "lon" => tree.insert_root("longitude", xmp_value(&property.value)),
            _ => {}
        }
        return;
    }

    tree.insert(prefix, name, xmp_value(&property.value));
}

fn xmp_value(raw: &str) -> MetaValue {
    match raw.trim().parse::<f64>() {
        Ok(n) => MetaValue::Number(n),
        Err(_) => MetaValue::Text(raw.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::extract_coordinate;
    use exif::experimental::Writer;
    use exif::{Field, Rational, Tag};

    fn rationals(values: &[(u32, u32)]) -> Value {
        Value::Rational(values.iter().map(|&(num, denom)| Rational { num, denom }).collect())
    }

    fn ascii(text: &str) -> Value {
        Value::Ascii(vec![text.as_bytes().to_vec()])
    }

    /// Build a little-endian TIFF blob carrying the given primary-IFD fields.
    fn tiff_with(fields: &[Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, true).unwrap();
        buf.into_inner()
    }

    fn gps_fields(lat_ref: &str) -> Vec<Field> {
        vec![
            Field {
                tag: Tag::GPSLatitudeRef,
                ifd_num: In::PRIMARY,
                value: ascii(lat_ref),
            },
            Field {
                tag: Tag::GPSLatitude,
                ifd_num: In::PRIMARY,
                value: rationals(&[(8, 1), (22, 1), (192, 10)]),
            },
            Field {
                tag: Tag::GPSLongitudeRef,
                ifd_num: In::PRIMARY,
                value: ascii("E"),
            },
            Field {
                tag: Tag::GPSLongitude,
                ifd_num: In::PRIMARY,
                value: rationals(&[(124, 1), (51, 1), (522, 10)]),
            },
        ]
    }

    #[test]
    fn test_exif_gps_lands_in_gps_namespace() {
        let bytes = tiff_with(&gps_fields("N"));
        let tree = read_metadata(&bytes).unwrap();

        let gps = tree.namespace("gps").unwrap();
        assert_eq!(gps.get("GPSLatitudeRef"), Some(&MetaValue::Text("N".into())));
        assert!(matches!(gps.get("GPSLatitude"), Some(MetaValue::Components(v)) if v.len() == 3));
        assert!(!tree.root.contains_key("GPSLatitude"));
    }

    #[test]
    fn test_extract_from_exif_bytes() {
        let c = extract_coordinate(&tiff_with(&gps_fields("N"))).unwrap();
        assert!((c.latitude() - 8.372).abs() < 1e-4);
        assert!((c.longitude() - 124.8645).abs() < 1e-4);

        let c = extract_coordinate(&tiff_with(&gps_fields("S"))).unwrap();
        assert!((c.latitude() + 8.372).abs() < 1e-4);
    }

    #[test]
    fn test_zero_denominator_is_rejected() {
        let mut fields = gps_fields("N");
        fields[1].value = rationals(&[(8, 0), (22, 1), (0, 1)]);
        assert!(extract_coordinate(&tiff_with(&fields)).is_none());
    }

    #[test]
    fn test_xmp_only_photo() {
        let packet = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF><rdf:Description
            exif:GPSLatitude="8,22.116N" exif:GPSLongitude="124,51.804E"/></rdf:RDF></x:xmpmeta>"#;
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1];
        bytes.extend_from_slice(packet.as_bytes());

        let tree = read_metadata(&bytes).unwrap();
        assert_eq!(tree.root.get("GPSLatitudeRef"), Some(&MetaValue::Text("N".into())));

        let c = extract_coordinate(&bytes).unwrap();
        assert_eq!(c.latitude(), 8.3686);
        assert_eq!(c.longitude(), 124.8634);
    }

    #[test]
    fn test_xmp_single_quoted_attributes() {
        let packet = "<x:xmpmeta xmlns:x='adobe:ns:meta/'>\
            <rdf:RDF xmlns:rdf='http://www.w3.org/1999/02/22-rdf-syntax-ns#'>\
            <rdf:Description xmlns:exif='http://ns.adobe.com/exif/1.0/' \
            exif:GPSLatitude='8,22.116N' exif:GPSLongitude='124,51.804E'/>\
            </rdf:RDF></x:xmpmeta>";
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1];
        bytes.extend_from_slice(packet.as_bytes());

        let c = extract_coordinate(&bytes).unwrap();
        assert_eq!(c.latitude(), 8.3686);
        assert_eq!(c.longitude(), 124.8634);
    }

    #[test]
    fn test_geo_vocabulary_maps_to_decimal_pair() {
        let packet = r#"<x:xmpmeta><rdf:Description geo:lat="8.4290" geo:long="124.8140"/></x:xmpmeta>"#;
        let tree = read_metadata(packet.as_bytes()).unwrap();
        assert_eq!(tree.root.get("latitude"), Some(&MetaValue::Number(8.429)));
        assert_eq!(tree.root.get("longitude"), Some(&MetaValue::Number(124.814)));
    }

    #[test]
    fn test_garbage_bytes_degrade_to_none() {
        assert!(read_metadata(b"definitely not a photo").is_err());
        assert!(extract_coordinate(&[]).is_none());
        assert!(extract_coordinate(&[0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10]).is_none());
    }
}
