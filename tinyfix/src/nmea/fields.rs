//! Interpretation of raw field buffers, independent of sentence context.
//!
//! All decoders return `None` for empty or malformed input; the caller maps
//! that to the destination field's sentinel, never to zero.

/// Decodes an ASCII numeral with an optional leading `-` and at most one
/// decimal point into hundredths.
///
/// Precision is data driven: zero, one or two fraction digits are consumed
/// as they are actually present, further digits are ignored. `"545.4"`
/// becomes `54540`, `"0.9"` becomes `90`, `"8"` becomes `800`.
pub(crate) fn parse_decimal(term: &[u8]) -> Option<i32> {
    let (negative, digits) = match term.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, term),
    };
    let (whole, consumed) = parse_integer(digits)?;
    let mut value = whole.checked_mul(100)?;

    let mut rest = &digits[consumed..];
    if let Some((b'.', fraction)) = rest.split_first() {
        rest = fraction;
        if let Some(d) = rest.first().copied().filter(u8::is_ascii_digit) {
            value = value.checked_add(10 * i32::from(d - b'0'))?;
            if let Some(d) = rest.get(1).copied().filter(u8::is_ascii_digit) {
                value = value.checked_add(i32::from(d - b'0'))?;
            }
        }
    }
    Some(if negative { -value } else { value })
}

/// Decodes a `dddmm.mmmm` angle into hundred-thousandths of a degree.
///
/// The integer-degree width varies between latitude (two digits) and
/// longitude (three digits); both forms carry whole minutes in the last two
/// integer digits. Minute fractions are consumed data-driven to four digits.
/// The hemisphere sign is not applied here; it arrives in the following
/// field.
pub(crate) fn parse_degrees(term: &[u8]) -> Option<i32> {
    let (packed, consumed) = parse_integer(term)?;
    // whole minutes in ten-thousandths, then the fraction digits on top
    let mut minutes_e4 = (packed % 100) * 10_000;
    if let Some((b'.', fraction)) = term[consumed..].split_first() {
        let mut scale = 1_000;
        for digit in fraction.iter().copied().take_while(u8::is_ascii_digit) {
            minutes_e4 += scale * i32::from(digit - b'0');
            if scale == 1 {
                break;
            }
            scale /= 10;
        }
    }
    Some((packed / 100) * 100_000 + (minutes_e4 + 3) / 6)
}

/// Decodes an unsigned packed-decimal field such as the ddmmyy date.
pub(crate) fn parse_u32(term: &[u8]) -> Option<u32> {
    let (value, consumed) = parse_integer(term)?;
    if consumed == term.len() {
        Some(value as u32)
    } else {
        None
    }
}

/// Decodes a small unsigned count such as satellites in use.
pub(crate) fn parse_u8(term: &[u8]) -> Option<u8> {
    parse_u32(term).and_then(|v| u8::try_from(v).ok())
}

/// Leading run of ASCII digits as an integer, with the count of bytes
/// consumed. `None` when the run is empty or overflows.
fn parse_integer(term: &[u8]) -> Option<(i32, usize)> {
    let mut value: i32 = 0;
    let mut consumed = 0;
    for digit in term.iter().copied().take_while(u8::is_ascii_digit) {
        value = value
            .checked_mul(10)?
            .checked_add(i32::from(digit - b'0'))?;
        consumed += 1;
    }
    if consumed == 0 {
        None
    } else {
        Some((value, consumed))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimal_scales_to_hundredths() {
        assert_eq!(parse_decimal(b"545.4"), Some(54540));
        assert_eq!(parse_decimal(b"0.9"), Some(90));
        assert_eq!(parse_decimal(b"022.4"), Some(2240));
        assert_eq!(parse_decimal(b"8"), Some(800));
        assert_eq!(parse_decimal(b"123519"), Some(12351900));
    }

    #[test]
    fn decimal_precision_is_data_driven() {
        // extra fraction digits beyond hundredths are ignored
        assert_eq!(parse_decimal(b"1.234"), Some(123));
        assert_eq!(parse_decimal(b"1.2"), Some(120));
        assert_eq!(parse_decimal(b"1."), Some(100));
    }

    #[test]
    fn decimal_handles_sign_and_emptiness() {
        assert_eq!(parse_decimal(b"-12.3"), Some(-1230));
        assert_eq!(parse_decimal(b""), None);
        assert_eq!(parse_decimal(b"-"), None);
        assert_eq!(parse_decimal(b"M"), None);
    }

    #[test]
    fn decimal_rejects_overflow() {
        assert_eq!(parse_decimal(b"99999999999"), None);
    }

    #[test]
    fn degrees_from_canonical_fields() {
        // 48 deg 07.038 min
        assert_eq!(parse_degrees(b"4807.038"), Some(4_811_730));
        // 11 deg 31.000 min
        assert_eq!(parse_degrees(b"01131.000"), Some(1_151_667));
        assert_eq!(parse_degrees(b"0000.000"), Some(0));
    }

    #[test]
    fn degrees_without_fraction() {
        assert_eq!(parse_degrees(b"4807"), Some(4_811_667));
        assert_eq!(parse_degrees(b""), None);
    }

    #[test]
    fn packed_fields() {
        assert_eq!(parse_u32(b"230394"), Some(230_394));
        assert_eq!(parse_u32(b"08x"), None);
        assert_eq!(parse_u8(b"08"), Some(8));
        assert_eq!(parse_u8(b"300"), None);
    }
}
