//! # Chanvault Codec
//!
//! Text encoding of chanvault records.
//!
//! A record travels through the host as plain text, so every field is
//! printable. The layout is four comma-separated fields:
//!
//! ```text
//! <keyHashHex>,<0|1>,<nonceHex>,<ciphertextHex or n>
//! ```
//!
//! The second field says where the ciphertext lives. `0` means inline in
//! the fourth field. `1` means it travels as an attached blob and the
//! fourth field is the placeholder `n`.
//!
//! There is no version field. Changing the layout breaks every existing
//! channel.
//!
//! ## Usage
//!
//! ```
//! use chanvault_codec::{parse_record, serialize_record, DataLocation, EncodedRecord};
//!
//! let record = EncodedRecord::inline("ab12", vec![0; 12], vec![1, 2, 3]);
//! let text = serialize_record(&record);
//! assert_eq!(text, "ab12,0,000000000000000000000000,010203");
//!
//! let parsed = parse_record(&text).unwrap();
//! assert_eq!(parsed.location, DataLocation::Inline);
//! assert_eq!(parsed, record);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod record;

pub use error::{CodecError, CodecResult};
pub use record::{
    parse_record, peek_key_hash, serialize_record, DataLocation, EncodedRecord, DELIMITER,
    MAX_TEXT_LEN, PLACEHOLDER,
};
