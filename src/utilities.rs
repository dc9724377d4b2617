use std::sync::LazyLock;

pub static PAGE_SIZE: LazyLock<u64> = LazyLock::new(|| page_size::get() as u64);

/// `48 65 6c` style, one pair per byte.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bytes as characters, anything unprintable shown as `.`.
pub fn printable(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| {
            if byte.is_ascii_graphic() || *byte == b' ' {
                *byte as char
            } else {
                '.'
            }
        })
        .collect()
}

/// clap value parser for register and address arguments.
pub fn parse_hex(text: &str) -> Result<u64, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|error| format!("{text:?} is not hex: {error}"))
}
