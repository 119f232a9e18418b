//! NUL-terminated name buffers.

/// Copy `name` into `dst`, truncated on a char boundary, and terminate it.
///
/// Returns the number of name bytes written. An empty `dst` gets nothing.
pub fn copy_name(dst: &mut [u8], name: &str) -> usize {
    let Some(room) = dst.len().checked_sub(1) else {
        return 0;
    };

    let mut len = name.len().min(room);
    while !name.is_char_boundary(len) {
        len -= 1;
    }

    dst[..len].copy_from_slice(&name.as_bytes()[..len]);
    dst[len] = 0;
    len
}

/// Clear a name buffer to the empty name.
pub fn clear_name(dst: &mut [u8]) {
    if let Some(first) = dst.first_mut() {
        *first = 0;
    }
}

/// Bytes up to (not including) the first NUL.
pub fn terminated(buf: &[u8]) -> &[u8] {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    &buf[..end]
}

/// The terminated prefix of `buf` as text. Invalid UTF-8 yields `""`.
pub fn terminated_str(buf: &[u8]) -> &str {
    core::str::from_utf8(terminated(buf)).unwrap_or("")
}
