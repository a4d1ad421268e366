//! Types module for the main runtime, exposing error and result types.
//!
//! Most code in this module is based around coercion of error types into
//! a common error type, to be used as the general "Error" of this crate.
use logger::SetLoggerError;
use quick_xml::events::Event;
use quick_xml::Reader;
use rusoto_core::region::ParseRegionError;
use rusoto_core::request;

use std::fmt::{self, Debug, Display, Formatter};
use std::num::ParseIntError;
use std::{io, time};

/// Public type alias for a result with a `TrackerError` error type.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Delegating error wrapper for errors raised while tracking buckets.
///
/// The internal `String` representation enables cheap coercion from
/// other error types by binding their error messages through.
pub struct TrackerError(String);

impl Debug for TrackerError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Macro to implement `From` for provided types.
macro_rules! derive_from {
    ($type:ty) => {
        impl<'a> From<$type> for TrackerError {
            fn from(t: $type) -> TrackerError {
                TrackerError(t.to_string())
            }
        }
    };
}

// Easy derivations of derive_from.
derive_from!(&'a str);
derive_from!(io::Error);
derive_from!(clap::Error);
derive_from!(serde_json::Error);
derive_from!(SetLoggerError);
derive_from!(ParseIntError);
derive_from!(ParseRegionError);
derive_from!(humantime::DurationError);
derive_from!(request::TlsError);
derive_from!(time::SystemTimeError);
derive_from!(String);

/// Pulls the `<Message>` body out of an XML error payload, if any.
fn xml_message(msg: &str) -> Option<String> {
    if !msg.starts_with("<?xml") {
        return None;
    }

    let mut reader = Reader::from_str(msg);
    let mut buffer = Vec::new();

    loop {
        match reader.read_event(&mut buffer) {
            Ok(Event::Eof) | Err(_) => return None,
            Ok(Event::Start(ref e)) if e.name() == b"Message" => {
                return reader.read_text(b"Message", &mut Vec::new()).ok();
            }
            _ => (),
        }
        buffer.clear();
    }
}

/// Macro to implement `From` for Rusoto types.
macro_rules! derive_from_rusoto {
    ($type:ty) => {
        impl From<rusoto_core::RusotoError<$type>> for TrackerError {
            /// Converts a Rusoto error to a `TrackerError`.
            fn from(err: rusoto_core::RusotoError<$type>) -> TrackerError {
                let msg = err.to_string();
                TrackerError(xml_message(&msg).unwrap_or(msg))
            }
        }
    };
}

// derive error display for all used rusoto types
derive_from_rusoto!(rusoto_s3::DeleteObjectError);
derive_from_rusoto!(rusoto_s3::ListObjectsV2Error);
derive_from_rusoto!(rusoto_s3::PutObjectError);
derive_from_rusoto!(rusoto_dynamodb::PutItemError);
derive_from_rusoto!(rusoto_dynamodb::QueryError);
derive_from_rusoto!(rusoto_logs::FilterLogEventsError);
