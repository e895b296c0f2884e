/// Pascal string: 1-byte length, then that many bytes.
/// Maps 0-255 to `char`, exceeding ascii.
/// Trailing nulls within the counted bytes are ignored.
pub(crate) fn counted_string(bytes: &[u8]) -> String {
    let Some(count) = bytes.first() else {
        return String::new()
    };
    let end = (*count as usize + 1).min(bytes.len());
    bytes[1 .. end].iter()
        .filter_map(|b| if b != &0 {Some(*b as char)} else {None})
        .collect()
}

/// Fixed-size pascal string field (e.g. the 32-byte
/// compressor name in a video sample description).
/// The text is truncated to fit `field_len - 1` bytes.
pub(crate) fn to_counted(text: &str, field_len: usize) -> Vec<u8> {
    let mut field = vec![0u8; field_len];
    if field_len == 0 {
        return field
    }
    let latin: Vec<u8> = text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .take(field_len.saturating_sub(1))
        .collect();
    if let Some(first) = field.first_mut() {
        *first = latin.len() as u8;
    }
    field[1 .. latin.len() + 1].copy_from_slice(&latin);
    field
}

/// Latin-1 bytes to `String`.
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

/// `String` to Latin-1 bytes. Characters above 255 become `?`.
pub(crate) fn to_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
