//! Record text layout.

use crate::error::{CodecError, CodecResult};

/// Field delimiter.
pub const DELIMITER: char = ',';

/// Fourth-field placeholder for out-of-band records.
pub const PLACEHOLDER: &str = "n";

/// Text-length limit the inline threshold is measured against.
pub const MAX_TEXT_LEN: usize = 1999;

/// Minimum number of fields a record must have.
const MIN_FIELDS: usize = 3;

/// Where a record's ciphertext lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataLocation {
    /// Hex-encoded in the record text.
    Inline,
    /// In a blob attached to the record.
    OutOfBand,
}

impl DataLocation {
    /// Chooses the location for a payload.
    ///
    /// Inline when `2 * ciphertext_len + key_hash_len + 3` is strictly
    /// under [`MAX_TEXT_LEN`], out-of-band otherwise. Hex doubles the
    /// ciphertext and `3` covers the tag and two delimiters.
    ///
    /// # Example
    ///
    /// ```
    /// use chanvault_codec::DataLocation;
    ///
    /// assert_eq!(DataLocation::for_payload(64, 965), DataLocation::Inline);
    /// assert_eq!(DataLocation::for_payload(64, 966), DataLocation::OutOfBand);
    /// ```
    #[must_use]
    pub fn for_payload(key_hash_len: usize, ciphertext_len: usize) -> Self {
        let encoded = ciphertext_len
            .saturating_mul(2)
            .saturating_add(key_hash_len)
            .saturating_add(3);
        if encoded < MAX_TEXT_LEN {
            Self::Inline
        } else {
            Self::OutOfBand
        }
    }

    /// Returns the wire tag.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Inline => "0",
            Self::OutOfBand => "1",
        }
    }

    /// Parses a wire tag.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than `0` or `1`.
    pub fn from_tag(tag: &str) -> CodecResult<Self> {
        match tag {
            "0" => Ok(Self::Inline),
            "1" => Ok(Self::OutOfBand),
            other => Err(CodecError::invalid_location(other)),
        }
    }
}

/// The metadata and payload carried in a record's text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRecord {
    /// Hex key hash (the content address).
    pub key_hash: String,
    /// Where the ciphertext lives.
    pub location: DataLocation,
    /// AEAD nonce.
    pub nonce: Vec<u8>,
    /// Ciphertext for inline records. Always empty for out-of-band ones.
    pub data: Vec<u8>,
}

impl EncodedRecord {
    /// Creates an inline record.
    pub fn inline(key_hash: impl Into<String>, nonce: Vec<u8>, data: Vec<u8>) -> Self {
        Self {
            key_hash: key_hash.into(),
            location: DataLocation::Inline,
            nonce,
            data,
        }
    }

    /// Creates an out-of-band record.
    pub fn out_of_band(key_hash: impl Into<String>, nonce: Vec<u8>) -> Self {
        Self {
            key_hash: key_hash.into(),
            location: DataLocation::OutOfBand,
            nonce,
            data: Vec::new(),
        }
    }
}

/// Serializes a record to its text form.
#[must_use]
pub fn serialize_record(record: &EncodedRecord) -> String {
    let data = match record.location {
        DataLocation::Inline => hex::encode(&record.data),
        DataLocation::OutOfBand => PLACEHOLDER.to_string(),
    };
    format!(
        "{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{data}",
        record.key_hash,
        record.location.tag(),
        hex::encode(&record.nonce),
    )
}

/// Parses record text.
///
/// An inline record with no fourth field parses with empty data. Fields
/// past the fourth are ignored.
///
/// # Errors
///
/// Returns an error if the text has fewer than three fields, an unknown
/// location tag, or invalid hex in the nonce or inline data.
pub fn parse_record(text: &str) -> CodecResult<EncodedRecord> {
    let fields: Vec<&str> = text.split(DELIMITER).collect();
    if fields.len() < MIN_FIELDS {
        return Err(CodecError::too_few_fields(MIN_FIELDS, fields.len()));
    }

    let location = DataLocation::from_tag(fields[1])?;
    let nonce = hex::decode(fields[2]).map_err(|e| CodecError::invalid_hex("nonce", e))?;

    let data = match (location, fields.get(3)) {
        (DataLocation::Inline, Some(data)) => {
            hex::decode(data).map_err(|e| CodecError::invalid_hex("data", e))?
        }
        _ => Vec::new(),
    };

    Ok(EncodedRecord {
        key_hash: fields[0].to_string(),
        location,
        nonce,
        data,
    })
}

/// Returns the key hash field without parsing the rest of the record.
///
/// Returns `None` when the text has no delimiter at all, which no record
/// produced by [`serialize_record`] does.
#[must_use]
pub fn peek_key_hash(text: &str) -> Option<&str> {
    text.split_once(DELIMITER).map(|(hash, _)| hash)
}
