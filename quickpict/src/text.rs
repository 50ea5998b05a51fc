//! Text records and the Mac Roman character set.

use crate::error::Result;
use crate::reader::Reader;

/// Mac Roman code points 0x80 through 0xff.
#[rustfmt::skip]
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{a0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{f8ff}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

/// Decode Mac Roman bytes to a string.
pub(crate) fn decode_mac_roman(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                char::from(b)
            } else {
                MAC_ROMAN_HIGH[usize::from(b - 0x80)]
            }
        })
        .collect()
}

/// Read a length-prefixed string verbatim, as used for font names.
/// Returns the string and the total number of bytes consumed, length
/// byte included.
pub(crate) fn read_pascal_string(r: &mut Reader<'_>) -> Result<(String, usize)> {
    let len = usize::from(r.read_u8()?);
    let bytes = r.read_bytes(len)?;
    Ok((decode_mac_roman(bytes), 1 + len))
}

/// Read a length-prefixed text run, dropping the trailing control bytes
/// some writers pad text records with. Font names are not padded this
/// way and go through [`read_pascal_string`] instead.
pub(crate) fn read_text_run(r: &mut Reader<'_>) -> Result<(String, usize)> {
    let len = usize::from(r.read_u8()?);
    let mut bytes = r.read_bytes(len)?;
    while let [head @ .., last] = bytes {
        if *last >= 32 {
            break;
        }
        bytes = head;
    }
    Ok((decode_mac_roman(bytes), 1 + len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(decode_mac_roman(b"Hello, world"), "Hello, world");
    }

    #[test]
    fn high_bytes_map_to_mac_roman() {
        // 0x8e is e-acute, 0xa5 is the bullet.
        assert_eq!(decode_mac_roman(&[0x8e, 0xa5]), "é•");
        assert_eq!(decode_mac_roman(&[0xd5]), "’");
    }

    #[test]
    fn text_run_strips_trailing_controls() {
        let data = [5u8, b'a', b'b', b'c', 0x0d, 0x00];
        let mut r = Reader::new(&data);
        let (s, consumed) = read_text_run(&mut r).unwrap();
        assert_eq!(s, "abc");
        assert_eq!(consumed, 6);
        assert_eq!(r.tell(), 6);
    }

    #[test]
    fn pascal_string_is_verbatim() {
        // Same padded bytes: a plain pascal read keeps them.
        let data = [5u8, b'a', b'b', b'c', 0x0d, 0x00];
        let mut r = Reader::new(&data);
        let (s, consumed) = read_pascal_string(&mut r).unwrap();
        assert_eq!(s, "abc\r\0");
        assert_eq!(consumed, 6);
    }

    #[test]
    fn empty_pascal_string() {
        let mut r = Reader::new(&[0u8]);
        let (s, consumed) = read_pascal_string(&mut r).unwrap();
        assert_eq!(s, "");
        assert_eq!(consumed, 1);
    }
}
