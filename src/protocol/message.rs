//! Tagged messages and the per-topology tag space

use super::header::{HEADER_LEN, encode_header};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Tag byte: orientation update (client → server)
pub const TAG_CONTROL: u8 = 0x01;
/// Tag byte: flow-control acknowledgement (either direction)
pub const TAG_ACK: u8 = 0x02;
/// Tag byte: video frame, or left eye in the stereo tag space
pub const TAG_VIDEO: u8 = 0x03;
/// Tag byte: right eye (stereo tag space only)
pub const TAG_VIDEO_RIGHT: u8 = 0x04;

/// Ack payload
pub const ACK_PAYLOAD: &[u8] = b"ack";

/// How video tags are interpreted on a given deployment.
///
/// 0x03 means "combined video" in one deployment and "left eye" in the
/// other, so both ends must agree on the tag space up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSpace {
    /// One side-by-side stream: 0x03 = Video
    #[default]
    Combined,
    /// Two eye streams: 0x03 = VideoLeft, 0x04 = VideoRight
    Stereo,
}

/// Decoded message type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Control,
    Ack,
    Video,
    VideoLeft,
    VideoRight,
    /// Tag not defined in the active tag space
    Unknown(u8),
}

impl TypeTag {
    /// Interpret a wire tag byte under the given tag space
    pub fn from_wire(byte: u8, space: TagSpace) -> Self {
        match (byte, space) {
            (TAG_CONTROL, _) => TypeTag::Control,
            (TAG_ACK, _) => TypeTag::Ack,
            (TAG_VIDEO, TagSpace::Combined) => TypeTag::Video,
            (TAG_VIDEO, TagSpace::Stereo) => TypeTag::VideoLeft,
            (TAG_VIDEO_RIGHT, TagSpace::Stereo) => TypeTag::VideoRight,
            (other, _) => TypeTag::Unknown(other),
        }
    }

    /// Wire byte for this tag
    pub fn to_wire(self) -> u8 {
        match self {
            TypeTag::Control => TAG_CONTROL,
            TypeTag::Ack => TAG_ACK,
            TypeTag::Video | TypeTag::VideoLeft => TAG_VIDEO,
            TypeTag::VideoRight => TAG_VIDEO_RIGHT,
            TypeTag::Unknown(b) => b,
        }
    }

    /// True for any of the video variants
    pub fn is_video(self) -> bool {
        matches!(
            self,
            TypeTag::Video | TypeTag::VideoLeft | TypeTag::VideoRight
        )
    }
}

/// One complete length-prefixed message.
///
/// The payload is owned; the length on the wire is always `payload.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub tag: u8,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(tag: u8, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }

    /// The literal `"ack"` acknowledgement
    pub fn ack() -> Self {
        Self::new(TAG_ACK, ACK_PAYLOAD.to_vec())
    }

    /// Payload length as carried in the header
    #[inline]
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    /// Decode the tag under a tag space
    pub fn type_tag(&self, space: TagSpace) -> TypeTag {
        TypeTag::from_wire(self.tag, space)
    }

    /// Serialize header + payload into one contiguous buffer
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        encode_into(self.tag, &self.payload, &mut buf)?;
        Ok(buf)
    }
}

/// Append a framed message to `buf` (buffer is not cleared)
pub fn encode_into(tag: u8, payload: &[u8], buf: &mut Vec<u8>) -> Result<()> {
    let header = encode_header(tag, payload.len())?;
    buf.reserve(HEADER_LEN + payload.len());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(payload);
    Ok(())
}
