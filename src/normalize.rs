use crate::buffer::Buffer;

/// Prefix emitted before a key whose first character is not a letter or digit.
const INVALID_START_PREFIX: &str = "LOGF";

/// Append `key` to `buf` as a journal field name.
///
/// Journal field names are upper-case ASCII letters, digits and underscores
/// and may not start with an underscore. Lower-case letters are upper-cased,
/// every other character (a whole multi-byte sequence counts as one) becomes
/// `_`, and a key starting with such a character gets the `LOGF` prefix.
pub fn append_normalized_key(buf: &mut Buffer, key: &str) {
    for (i, c) in key.char_indices() {
        match c {
            '0'..='9' | 'A'..='Z' => buf.push(c as u8),
            'a'..='z' => buf.push(c as u8 - 0x20),
            _ => {
                if i == 0 {
                    buf.push_str(INVALID_START_PREFIX);
                }
                buf.push(b'_');
            }
        }
    }
}

/// Allocating variant of [`append_normalized_key`].
pub fn normalize_key(key: &str) -> String {
    let mut buf = Buffer::with_capacity(key.len() + INVALID_START_PREFIX.len());
    append_normalized_key(&mut buf, key);
    // Only ASCII is ever written.
    String::from_utf8_lossy(buf.as_bytes()).into_owned()
}
