//! Length-prefixed entry format with a CRC32 trailer

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FlatDbError, Result};

/// Magic bytes identifying a framed entry file
const MAGIC: &[u8; 4] = b"FDBF";

/// Magic (4) + Count (4)
const HEADER_SIZE: usize = 8;

const CRC_SIZE: usize = 4;

pub(super) fn encode(values: &[&str]) -> Vec<u8> {
    let body_len: usize = values.iter().map(|v| 4 + v.len()).sum();
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + body_len + CRC_SIZE);

    buf.put_slice(MAGIC);
    buf.put_u32_le(values.len() as u32);
    for value in values {
        buf.put_u32_le(value.len() as u32);
        buf.put_slice(value.as_bytes());
    }

    let crc = crc32fast::hash(&buf);
    buf.put_u32_le(crc);

    buf.to_vec()
}

pub(super) fn decode(bytes: &[u8]) -> Result<Vec<String>> {
    if bytes.len() < HEADER_SIZE + CRC_SIZE {
        return Err(FlatDbError::CorruptEntry(format!(
            "framed entry too short: {} bytes",
            bytes.len()
        )));
    }

    let (body, mut trailer) = bytes.split_at(bytes.len() - CRC_SIZE);
    let stored_crc = trailer.get_u32_le();
    let computed_crc = crc32fast::hash(body);
    if stored_crc != computed_crc {
        return Err(FlatDbError::CorruptEntry(format!(
            "checksum mismatch: stored {:#010x}, computed {:#010x}",
            stored_crc, computed_crc
        )));
    }

    let mut body = body;
    if &body[..4] != MAGIC {
        return Err(FlatDbError::CorruptEntry("bad magic".to_string()));
    }
    body.advance(4);

    let count = body.get_u32_le() as usize;
    if count == 0 {
        return Err(FlatDbError::CorruptEntry(
            "no delimited fields found".to_string(),
        ));
    }

    // Each value needs at least its 4-byte length prefix
    if count > body.remaining() / 4 {
        return Err(FlatDbError::CorruptEntry(format!(
            "field count {} exceeds what {} bytes can hold",
            count,
            body.remaining()
        )));
    }

    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        if body.remaining() < 4 {
            return Err(FlatDbError::CorruptEntry("truncated length".to_string()));
        }
        let len = body.get_u32_le() as usize;
        if body.remaining() < len {
            return Err(FlatDbError::CorruptEntry("truncated value".to_string()));
        }
        let value = std::str::from_utf8(&body[..len])
            .map_err(|e| FlatDbError::CorruptEntry(format!("value is not UTF-8: {}", e)))?
            .to_string();
        body.advance(len);
        values.push(value);
    }

    if body.has_remaining() {
        return Err(FlatDbError::CorruptEntry(format!(
            "{} trailing bytes after last field",
            body.remaining()
        )));
    }

    Ok(values)
}
