//! Parsing S3 request documents.

use courier_s3_model::types::{
    CompletedMultipartUpload, CompletedPart, PublicAccessBlockConfiguration,
};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::XmlError;

/// Trait for deserializing S3 types from XML.
///
/// The root element has already been consumed by the caller; the implementation
/// reads child elements until the matching end tag.
pub trait S3Deserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or required fields are missing.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize S3-compatible XML into a typed value.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or deserialization fails.
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                return T::deserialize_xml(&mut reader);
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            // Declaration, comments, processing instructions, whitespace.
            _ => {}
        }
    }
}

/// Read the text content of the current element and consume its end tag.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::GeneralRef(e) => {
                // Entity references such as `&quot;` arrive as separate events.
                let name = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let entity = format!("&{name};");
                let unescaped = quick_xml::escape::unescape(&entity)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(_) => {
                return Ok(text);
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

fn parse_bool(s: &str) -> Result<bool, XmlError> {
    match s {
        "true" | "TRUE" | "True" => Ok(true),
        "false" | "FALSE" | "False" => Ok(false),
        _ => Err(XmlError::ParseError(format!("invalid boolean: {s}"))),
    }
}

fn parse_u32(s: &str) -> Result<u32, XmlError> {
    s.parse::<u32>()
        .map_err(|e| XmlError::ParseError(format!("invalid integer '{s}': {e}")))
}

fn element_name(e: &quick_xml::events::BytesStart<'_>) -> Result<String, XmlError> {
    std::str::from_utf8(e.name().as_ref())
        .map(ToOwned::to_owned)
        .map_err(|e| XmlError::ParseError(e.to_string()))
}

/// Collect every `item_tag` child of the current element, skipping anything else.
fn deserialize_list<T: S3Deserialize>(
    reader: &mut Reader<&[u8]>,
    item_tag: &str,
) -> Result<Vec<T>, XmlError> {
    let mut items = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if element_name(&e)? == item_tag {
                    items.push(T::deserialize_xml(reader)?);
                } else {
                    skip_element(reader)?;
                }
            }
            Event::End(_) => return Ok(items),
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(format!(
                    "unexpected EOF in list of {item_tag}"
                )));
            }
            _ => {}
        }
    }
}

impl S3Deserialize for CompletedPart {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut part_number = None;
        let mut etag = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => match element_name(&e)?.as_str() {
                    "PartNumber" => {
                        let text = read_text_content(reader)?;
                        part_number = Some(parse_u32(text.trim())?);
                    }
                    "ETag" => etag = Some(read_text_content(reader)?),
                    _ => skip_element(reader)?,
                },
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Part".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(CompletedPart { part_number, etag })
    }
}

impl S3Deserialize for CompletedMultipartUpload {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let parts = deserialize_list(reader, "Part")?;
        Ok(CompletedMultipartUpload { parts })
    }
}

impl S3Deserialize for PublicAccessBlockConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut config = PublicAccessBlockConfiguration::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = element_name(&e)?;
                    let slot = match name.as_str() {
                        "BlockPublicAcls" => &mut config.block_public_acls,
                        "IgnorePublicAcls" => &mut config.ignore_public_acls,
                        "BlockPublicPolicy" => &mut config.block_public_policy,
                        "RestrictPublicBuckets" => &mut config.restrict_public_buckets,
                        _ => {
                            skip_element(reader)?;
                            continue;
                        }
                    };
                    let text = read_text_content(reader)?;
                    *slot = Some(parse_bool(text.trim())?);
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in PublicAccessBlockConfiguration".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_deserialize_complete_multipart_upload_in_declared_order() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
        <CompleteMultipartUpload xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
            <Part><ETag>"bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"</ETag><PartNumber>2</PartNumber></Part>
            <Part><PartNumber>1</PartNumber><ETag>aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa</ETag></Part>
        </CompleteMultipartUpload>"#;

        let upload: CompletedMultipartUpload = from_xml(xml).expect("should parse");
        assert_eq!(upload.parts.len(), 2);
        assert_eq!(upload.parts[0].part_number, Some(2));
        assert_eq!(
            upload.parts[0].etag.as_deref(),
            Some("\"bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\"")
        );
        assert_eq!(upload.parts[1].part_number, Some(1));
    }

    #[test]
    fn test_should_unescape_quoted_etag_entities() {
        let xml = b"<CompleteMultipartUpload><Part><PartNumber>1</PartNumber>\
            <ETag>&quot;aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa&quot;</ETag></Part></CompleteMultipartUpload>";

        let upload: CompletedMultipartUpload = from_xml(xml).expect("should parse");
        assert_eq!(
            upload.parts[0].etag.as_deref(),
            Some("\"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"")
        );
    }

    #[test]
    fn test_should_reject_non_numeric_part_number() {
        let xml = b"<CompleteMultipartUpload><Part><PartNumber>one</PartNumber></Part></CompleteMultipartUpload>";
        let result: Result<CompletedMultipartUpload, _> = from_xml(xml);
        assert!(matches!(result, Err(XmlError::ParseError(_))));
    }

    #[test]
    fn test_should_reject_document_without_root() {
        let result: Result<CompletedMultipartUpload, _> = from_xml(b"not xml at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_should_deserialize_public_access_block() {
        let xml = br#"<PublicAccessBlockConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
            <BlockPublicAcls>true</BlockPublicAcls>
            <IgnorePublicAcls>false</IgnorePublicAcls>
        </PublicAccessBlockConfiguration>"#;

        let config: PublicAccessBlockConfiguration = from_xml(xml).expect("should parse");
        assert_eq!(config.block_public_acls, Some(true));
        assert_eq!(config.ignore_public_acls, Some(false));
        assert!(config.block_public_policy.is_none());
    }
}
