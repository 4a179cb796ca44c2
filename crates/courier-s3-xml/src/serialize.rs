//! Rendering result records to S3 response documents.

use std::io::{self, Write};

use courier_s3_model::output::{
    CompleteMultipartUploadOutput, CreateMultipartUploadOutput, GetBucketLocationOutput,
    GetBucketVersioningOutput, ListBucketsOutput, ListObjectsOutput,
};
use courier_s3_model::types::{BucketEntry, ObjectEntry, Owner};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

use crate::error::XmlError;

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Storage class reported for every object.
const STORAGE_CLASS: &str = "STANDARD";

/// Capability of a record to render itself into an S3 document.
///
/// Implementors write their content inside the current element; [`to_xml`] writes
/// the declaration and the namespaced root element.
///
/// Uses `io::Result` because `quick_xml::Writer` closures require `io::Result<()>`.
pub trait S3Serialize {
    /// Serialize this value as XML content into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a complete S3 document with declaration and namespace.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn to_xml<T: S3Serialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn write_optional_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: Option<&str>,
) -> io::Result<()> {
    if let Some(v) = value {
        write_text_element(writer, tag, v)?;
    }
    Ok(())
}

fn write_bool<W: Write>(writer: &mut Writer<W>, tag: &str, value: bool) -> io::Result<()> {
    write_text_element(writer, tag, if value { "true" } else { "false" })
}

/// Format a `DateTime<Utc>` as ISO 8601 with milliseconds and `Z` suffix.
fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn quote_etag(etag: &str) -> String {
    format!("\"{etag}\"")
}

impl S3Serialize for Owner {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Owner").write_inner_content(|w| {
            write_text_element(w, "ID", &self.id)?;
            write_optional_text(w, "DisplayName", self.display_name.as_deref())?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for BucketEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Bucket").write_inner_content(|w| {
            write_text_element(w, "Name", &self.name)?;
            write_text_element(w, "CreationDate", &format_timestamp(&self.creation_date))?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ObjectEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Contents").write_inner_content(|w| {
            write_text_element(w, "Key", &self.key)?;
            write_text_element(w, "LastModified", &format_timestamp(&self.last_modified))?;
            write_text_element(w, "ETag", &quote_etag(&self.etag))?;
            write_text_element(w, "Size", &self.size.to_string())?;
            self.owner.serialize_xml(w)?;
            write_text_element(w, "StorageClass", STORAGE_CLASS)?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ListBucketsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        self.owner.serialize_xml(writer)?;
        writer.create_element("Buckets").write_inner_content(|w| {
            for bucket in &self.buckets {
                bucket.serialize_xml(w)?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ListObjectsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Name", &self.name)?;
        write_text_element(writer, "Prefix", &self.prefix)?;
        write_text_element(writer, "Marker", &self.marker)?;
        write_text_element(writer, "MaxKeys", &self.max_keys.to_string())?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        write_optional_text(writer, "EncodingType", self.encoding_type.as_deref())?;
        for obj in &self.contents {
            obj.serialize_xml(writer)?;
        }
        Ok(())
    }
}

impl S3Serialize for CreateMultipartUploadOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "Key", &self.key)?;
        write_text_element(writer, "UploadId", &self.upload_id)?;
        Ok(())
    }
}

impl S3Serialize for CompleteMultipartUploadOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Location", &self.location)?;
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "Key", &self.key)?;
        write_text_element(writer, "ETag", &quote_etag(&self.etag))?;
        Ok(())
    }
}

impl S3Serialize for GetBucketLocationOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.write_event(Event::Text(BytesText::new(&self.location_constraint)))?;
        Ok(())
    }
}

impl S3Serialize for GetBucketVersioningOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Status", &self.status)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn render<T: S3Serialize>(root: &str, value: &T) -> String {
        let xml = to_xml(root, value).expect("serialization should succeed");
        String::from_utf8(xml).expect("valid UTF-8")
    }

    fn owner() -> Owner {
        Owner {
            id: "AKID".to_owned(),
            display_name: Some("alice".to_owned()),
        }
    }

    #[test]
    fn test_should_serialize_list_all_my_buckets_result() {
        let output = ListBucketsOutput {
            owner: owner(),
            buckets: vec![BucketEntry {
                name: "photos".to_owned(),
                creation_date: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            }],
        };

        let xml = render("ListAllMyBucketsResult", &output);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ListAllMyBucketsResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <Owner><ID>AKID</ID><DisplayName>alice</DisplayName></Owner>\
             <Buckets><Bucket><Name>photos</Name>\
             <CreationDate>2024-01-02T03:04:05.000Z</CreationDate></Bucket></Buckets>\
             </ListAllMyBucketsResult>"
        );
    }

    #[test]
    fn test_should_serialize_list_bucket_result() {
        let output = ListObjectsOutput {
            name: "photos".to_owned(),
            prefix: String::new(),
            marker: String::new(),
            max_keys: 1000,
            is_truncated: false,
            encoding_type: None,
            contents: vec![ObjectEntry {
                key: "cat.png".to_owned(),
                last_modified: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
                etag: "d41d8cd98f00b204e9800998ecf8427e".to_owned(),
                size: 0,
                owner: owner(),
            }],
        };

        let xml = render("ListBucketResult", &output);
        assert!(xml.contains("<Name>photos</Name><Prefix></Prefix><Marker></Marker>"));
        assert!(xml.contains("<MaxKeys>1000</MaxKeys><IsTruncated>false</IsTruncated>"));
        assert!(!xml.contains("EncodingType"));
        assert!(xml.contains(
            "<Contents><Key>cat.png</Key>\
             <LastModified>2024-01-02T03:04:05.000Z</LastModified>\
             <ETag>&quot;d41d8cd98f00b204e9800998ecf8427e&quot;</ETag>\
             <Size>0</Size>\
             <Owner><ID>AKID</ID><DisplayName>alice</DisplayName></Owner>\
             <StorageClass>STANDARD</StorageClass></Contents>"
        ));
    }

    #[test]
    fn test_should_serialize_initiate_multipart_upload_result() {
        let output = CreateMultipartUploadOutput {
            bucket: "photos".to_owned(),
            key: "big.bin".to_owned(),
            upload_id: "abc123".to_owned(),
        };

        let xml = render("InitiateMultipartUploadResult", &output);
        assert!(xml.contains(
            "<InitiateMultipartUploadResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <Bucket>photos</Bucket><Key>big.bin</Key><UploadId>abc123</UploadId>\
             </InitiateMultipartUploadResult>"
        ));
    }

    #[test]
    fn test_should_serialize_complete_multipart_upload_result() {
        let output = CompleteMultipartUploadOutput {
            location: "/photos/big.bin".to_owned(),
            bucket: "photos".to_owned(),
            key: "big.bin".to_owned(),
            etag: "0123456789abcdef0123456789abcdef-2".to_owned(),
        };

        let xml = render("CompleteMultipartUploadResult", &output);
        assert!(xml.contains("<Location>/photos/big.bin</Location>"));
        assert!(xml.contains("<ETag>&quot;0123456789abcdef0123456789abcdef-2&quot;</ETag>"));
    }

    #[test]
    fn test_should_serialize_location_constraint_as_text() {
        let output = GetBucketLocationOutput {
            location_constraint: "us-east-1".to_owned(),
        };

        let xml = render("LocationConstraint", &output);
        assert!(xml.ends_with(
            "<LocationConstraint xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">us-east-1</LocationConstraint>"
        ));
    }

    #[test]
    fn test_should_serialize_disabled_versioning() {
        let output = GetBucketVersioningOutput {
            status: "Disabled".to_owned(),
        };

        let xml = render("VersioningConfiguration", &output);
        assert!(xml.contains("<Status>Disabled</Status>"));
    }
}
