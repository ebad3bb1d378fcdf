use std::borrow::Cow;

use encoding_rs::WINDOWS_1251;

// 0x98 has no Windows-1251 character; WHATWG decodes it to a C1 control.
const UNDEFINED: [char; 2] = ['\u{98}', '\u{fffd}'];

/// Decodes uploaded text: UTF-8 (BOM allowed), otherwise Windows-1251.
///
/// Undefined bytes are dropped rather than replaced.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return Cow::Borrowed(text);
    }

    let (text, _) = WINDOWS_1251.decode_without_bom_handling(bytes);
    if text.contains(UNDEFINED) {
        Cow::Owned(text.chars().filter(|c| !UNDEFINED.contains(c)).collect())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        assert_eq!(decode_text("Прывітанне, свет".as_bytes()), "Прывітанне, свет");
        assert!(matches!(decode_text(b"plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn strips_utf8_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBF\xD0\xBA\xD0\xBE\xD1\x82"), "кот");
        assert_eq!(decode_text(b"\xEF\xBB\xBF"), "");
    }

    #[test]
    fn falls_back_to_windows_1251() {
        // "Привет мир" in Windows-1251.
        let bytes = b"\xCF\xF0\xE8\xE2\xE5\xF2 \xEC\xE8\xF0";
        assert_eq!(decode_text(bytes), "Привет мир");
        // Belarusian і and ў.
        assert_eq!(decode_text(b"\xB3 \xA2"), "і ў");
    }

    #[test]
    fn drops_unmappable_bytes() {
        assert_eq!(decode_text(b"\xEA\xEE\x98\xF2"), "кот");
    }
}
