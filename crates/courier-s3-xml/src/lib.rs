//! S3 XML rendering and parsing for the Courier gateway.
//!
//! - [`S3Serialize`] and [`to_xml`] render result records as response documents
//! - [`S3Deserialize`] and [`from_xml`] parse request documents
//! - [`error_to_xml`] renders the `<Error>` document
//!
//! Result documents carry the `http://s3.amazonaws.com/doc/2006-03-01/` namespace,
//! lowercase booleans and millisecond ISO 8601 timestamps.

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{S3Deserialize, from_xml};
pub use error::{XmlError, error_to_xml};
pub use serialize::{S3_NAMESPACE, S3Serialize, to_xml};
