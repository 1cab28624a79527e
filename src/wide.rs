/// Encode `text` as a NUL-terminated UTF-16 string for Win32 calls.
pub fn to_wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Copy `text` into a fixed-size UTF-16 buffer such as `szTip`.
///
/// The text is truncated to leave room for the terminator and the rest of the
/// buffer is zeroed. A surrogate pair is never split at the cut. Returns the
/// number of code units written, excluding the terminator.
pub fn fill(dst: &mut [u16], text: &str) -> usize {
    if dst.is_empty() {
        return 0;
    }
    let capacity = dst.len() - 1;
    let mut len = 0;
    for ch in text.chars() {
        let mut units = [0u16; 2];
        let encoded = ch.encode_utf16(&mut units);
        if len + encoded.len() > capacity {
            break;
        }
        dst[len..len + encoded.len()].copy_from_slice(encoded);
        len += encoded.len();
    }
    dst[len..].fill(0);
    len
}

/// Like [`fill`], but returns the buffer by value. Use this for fields of
/// packed OS structs, which must be assigned rather than borrowed.
pub fn filled<const N: usize>(text: &str) -> [u16; N] {
    let mut buf = [0u16; N];
    fill(&mut buf, text);
    buf
}
