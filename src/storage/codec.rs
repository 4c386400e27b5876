//! Entry record framing.
//!
//! An entry file holds `u32` little-endian key length, the bincode-encoded key, then the
//! bincode-encoded value. The explicit key length lets the durable tier rebuild its index
//! by reading only the key prefix of each file.

use std::io::Read;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{StorageError, StorageResult};

/// Size of the key length header.
pub const KEY_LEN_BYTES: usize = 4;

/// Encodes a key on its own (used for fingerprints and framing).
pub fn encode_key<K: Serialize>(key: &K) -> StorageResult<Vec<u8>> {
    bincode::serialize(key).map_err(|e| StorageError::Codec(e.to_string()))
}

/// Decodes a key from its encoded bytes.
pub fn decode_key<K: DeserializeOwned>(bytes: &[u8]) -> StorageResult<K> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Codec(e.to_string()))
}

/// Frames already-encoded key bytes with an encoded value.
pub fn encode_record<V: Serialize>(key_bytes: &[u8], value: &V) -> StorageResult<Vec<u8>> {
    let key_len = u32::try_from(key_bytes.len())
        .map_err(|_| StorageError::Codec(format!("key too large: {} bytes", key_bytes.len())))?;
    let value_bytes = bincode::serialize(value).map_err(|e| StorageError::Codec(e.to_string()))?;

    let mut out = Vec::with_capacity(KEY_LEN_BYTES + key_bytes.len() + value_bytes.len());
    out.extend_from_slice(&key_len.to_le_bytes());
    out.extend_from_slice(key_bytes);
    out.extend_from_slice(&value_bytes);
    Ok(out)
}

/// Splits a framed record into `(key bytes, value bytes)`.
pub fn split_record(bytes: &[u8]) -> StorageResult<(&[u8], &[u8])> {
    if bytes.len() < KEY_LEN_BYTES {
        return Err(StorageError::Codec(format!(
            "record of {} bytes has no key header",
            bytes.len()
        )));
    }
    let (header, rest) = bytes.split_at(KEY_LEN_BYTES);
    let key_len = read_key_len(header);
    if rest.len() < key_len {
        return Err(StorageError::Codec(format!(
            "key length {} exceeds record body of {} bytes",
            key_len,
            rest.len()
        )));
    }
    Ok(rest.split_at(key_len))
}

/// Decodes a whole framed record.
pub fn decode_record<K, V>(bytes: &[u8]) -> StorageResult<(K, V)>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    let (key_bytes, value_bytes) = split_record(bytes)?;
    let key = decode_key(key_bytes)?;
    let value = bincode::deserialize(value_bytes).map_err(|e| StorageError::Codec(e.to_string()))?;
    Ok((key, value))
}

/// Reads only the framed key bytes from the head of `reader`.
///
/// `record_len` is the size of the whole record; a header claiming more key bytes than
/// that is rejected before anything is allocated.
pub fn read_key_prefix<R: Read>(reader: &mut R, record_len: usize) -> StorageResult<Vec<u8>> {
    let mut header = [0u8; KEY_LEN_BYTES];
    reader.read_exact(&mut header)?;
    let key_len = read_key_len(&header);
    if key_len > record_len.saturating_sub(KEY_LEN_BYTES) {
        return Err(StorageError::Codec(format!(
            "key length {} exceeds record of {} bytes",
            key_len, record_len
        )));
    }
    let mut key_bytes = vec![0u8; key_len];
    reader.read_exact(&mut key_bytes)?;
    Ok(key_bytes)
}

fn read_key_len(header: &[u8]) -> usize {
    let mut buf = [0u8; KEY_LEN_BYTES];
    buf.copy_from_slice(&header[..KEY_LEN_BYTES]);
    u32::from_le_bytes(buf) as usize
}
