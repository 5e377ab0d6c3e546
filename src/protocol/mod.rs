//! Wire protocol: header codec, tagged messages, frame reader, control encoding

pub mod control;
pub mod header;
pub mod message;
pub mod reader;

pub use control::{OrientationMapping, OrientationSample, encode_control, normalize_angle};
pub use header::{HEADER_LEN, decode_length, encode_header};
pub use message::{
    ACK_PAYLOAD, Message, TAG_ACK, TAG_CONTROL, TAG_VIDEO, TAG_VIDEO_RIGHT, TagSpace, TypeTag,
};
pub use reader::{Frame, FrameReader, read_message};
