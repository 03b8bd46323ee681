//! # Version Records
//!
//! The unit of storage: one entity identity, one STAMP, one payload.
//!
//! Format on disk: Header (4 bytes) + postcard-serialized `VersionRecord`.
//! - 3 bytes: Magic ("TWV")
//! - 1 byte: Version
//!
//! The header is validated before the payload is parsed.

use crate::constituent::ConstituentData;
use crate::limits::{RECORD_FORMAT_VERSION, RECORD_HEADER_LEN, RECORD_MAGIC};
use crate::{EntityRef, NodeKind, PublicId, Stamp, StoreError};
use serde::{Deserialize, Serialize};

/// What a version says about its entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// A concept and the ordered ids of its attached constituents.
    Concept { children: Vec<PublicId> },
    /// A constituent, the entity it is attached to, and its own children.
    Constituent {
        data: ConstituentData,
        referenced_component: PublicId,
        children: Vec<PublicId>,
    },
}

/// One stamped version of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub identity: EntityRef,
    pub stamp: Stamp,
    pub payload: Payload,
}

impl VersionRecord {
    #[must_use]
    pub fn public_id(&self) -> PublicId {
        self.identity.public_id()
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match &self.payload {
            Payload::Concept { .. } => NodeKind::Concept,
            Payload::Constituent { data, .. } => data.kind(),
        }
    }

    /// Ordered ids of the entities attached to this one.
    #[must_use]
    pub fn children(&self) -> &[PublicId] {
        match &self.payload {
            Payload::Concept { children } | Payload::Constituent { children, .. } => children,
        }
    }

    /// The entity this constituent is attached to; `None` for concepts.
    #[must_use]
    pub fn referenced_component(&self) -> Option<PublicId> {
        match &self.payload {
            Payload::Concept { .. } => None,
            Payload::Constituent {
                referenced_component,
                ..
            } => Some(*referenced_component),
        }
    }

    /// Constituent payload, `None` for concepts.
    #[must_use]
    pub fn data(&self) -> Option<&ConstituentData> {
        match &self.payload {
            Payload::Concept { .. } => None,
            Payload::Constituent { data, .. } => Some(data),
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode a record as header + postcard payload.
pub fn encode_record(record: &VersionRecord) -> Result<Vec<u8>, StoreError> {
    let payload =
        postcard::to_stdvec(record).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let mut bytes = Vec::with_capacity(RECORD_HEADER_LEN + payload.len());
    bytes.extend_from_slice(RECORD_MAGIC);
    bytes.push(RECORD_FORMAT_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a record, validating the header first.
pub fn decode_record(bytes: &[u8]) -> Result<VersionRecord, StoreError> {
    if bytes.len() < RECORD_HEADER_LEN {
        return Err(StoreError::Serialization(format!(
            "Record too short: minimum {} bytes required",
            RECORD_HEADER_LEN
        )));
    }
    if &bytes[..RECORD_MAGIC.len()] != RECORD_MAGIC {
        return Err(StoreError::Serialization(
            "Invalid record magic bytes".to_string(),
        ));
    }
    let version = bytes[RECORD_MAGIC.len()];
    if version != RECORD_FORMAT_VERSION {
        return Err(StoreError::Serialization(format!(
            "Unsupported record version: {} (expected {})",
            version, RECORD_FORMAT_VERSION
        )));
    }

    postcard::from_bytes(&bytes[RECORD_HEADER_LEN..])
        .map_err(|e| StoreError::Serialization(format!("Failed to decode record: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constituent::Comment;
    use crate::{Status, Timestamp, terms};

    fn comment_record() -> VersionRecord {
        VersionRecord {
            identity: EntityRef::known("C1", PublicId::from_u128(11)),
            stamp: Stamp::new(
                Status::Active,
                Timestamp::from_millis(42),
                terms::user(),
                terms::development_module(),
                terms::development_path(),
            ),
            payload: Payload::Constituent {
                data: ConstituentData::Comment(Comment {
                    text: "Comment on FQN1".to_string(),
                }),
                referenced_component: PublicId::from_u128(10),
                children: vec![PublicId::from_u128(12)],
            },
        }
    }

    #[test]
    fn encoded_record_decodes_with_description() {
        let record = comment_record();
        let bytes = encode_record(&record).expect("encode");
        let restored = decode_record(&bytes).expect("decode");

        assert_eq!(restored, record);
        assert_eq!(restored.identity.description(), Some("C1"));
        assert_eq!(restored.kind(), NodeKind::Comment);
        assert_eq!(restored.referenced_component(), Some(PublicId::from_u128(10)));
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = encode_record(&comment_record()).expect("encode");
        bytes[0] = b'X';
        assert!(matches!(
            decode_record(&bytes),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = encode_record(&comment_record()).expect("encode");
        bytes[3] = RECORD_FORMAT_VERSION + 1;
        assert!(decode_record(&bytes).is_err());
    }

    #[test]
    fn truncated_record_rejected() {
        assert!(decode_record(b"TW").is_err());
    }

    #[test]
    fn concept_record_has_no_referenced_component() {
        let record = VersionRecord {
            payload: Payload::Concept { children: vec![] },
            ..comment_record()
        };
        assert_eq!(record.kind(), NodeKind::Concept);
        assert_eq!(record.referenced_component(), None);
        assert!(record.data().is_none());
    }
}
