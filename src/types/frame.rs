//! Encoded frame payloads

use bytes::Bytes;

/// One fully encoded frame, ready to be sent as a single binary message
///
/// Cloning is cheap: the payload is reference counted, so a frame handed to
/// the transport stays valid after its pool has been replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    payload: Bytes,
}

impl EncodedFrame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self { payload: payload.into() }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl AsRef<[u8]> for EncodedFrame {
    fn as_ref(&self) -> &[u8] {
        &self.payload
    }
}
