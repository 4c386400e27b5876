//! Key fingerprints used to name entry files.

/// Returns the full BLAKE3 hash of encoded key bytes as lowercase hex.
///
/// The full 256-bit output is used because the fingerprint doubles as the entry file
/// name: two keys sharing a fingerprint would share a file. The decoded key is still
/// compared on load, so a collision surfaces as a corrupt-entry error rather than a
/// silent overwrite.
#[inline]
pub fn key_fingerprint(key_bytes: &[u8]) -> String {
    blake3::hash(key_bytes).to_hex().to_string()
}
