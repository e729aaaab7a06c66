/// Parse a sensitivity string the way C `atof` does, independent of locale.
///
/// Leading whitespace is skipped and the longest prefix that forms a decimal
/// floating-point literal is converted; trailing garbage is ignored. Input
/// with no such prefix (including the empty string) yields `0.0`. The value
/// is parsed at double precision and then narrowed to `f32`.
pub fn parse_sensitivity(input: &str) -> f32 {
    parse_prefix(input) as f32
}

/// The C locale's `isspace` set, which unlike `char::is_ascii_whitespace`
/// includes vertical tab.
fn is_c_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

fn parse_prefix(input: &str) -> f64 {
    let s = input.trim_start_matches(is_c_space);
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    if let Some(value) = parse_special(&s[end..]) {
        return if s.starts_with('-') { -value } else { value };
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return 0.0;
    }

    // Exponent only counts when at least one digit follows it
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn parse_special(s: &str) -> Option<f64> {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    if lower.starts_with("infinity") || lower.starts_with("inf") {
        Some(f64::INFINITY)
    } else if lower.starts_with("nan") {
        Some(f64::NAN)
    } else {
        None
    }
}
