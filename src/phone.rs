//! Vietnamese phone number normalization.

const COUNTRY_CODE: &str = "84";

/// Normalizes a Vietnamese phone number to E.164 (`+84...`).
///
/// Accepts national (`0987654321`), bare international (`84987654321`) and
/// E.164 (`+84987654321`) forms, ignoring spaces, dots, dashes and
/// parentheses. Returns `None` when the number is not a recognized mobile
/// or landline number.
pub fn normalize_vn(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '.' | '-' | '(' | ')' => {}
            _ => return None,
        }
    }

    let national = if plus {
        digits.strip_prefix(COUNTRY_CODE)?
    } else if let Some(n) = digits.strip_prefix('0') {
        n
    } else {
        digits.strip_prefix(COUNTRY_CODE)?
    };

    if is_valid_national(national) {
        Some(format!("+{COUNTRY_CODE}{national}"))
    } else {
        None
    }
}

/// Mobile numbers are 9 national digits within the allocated network
/// prefixes; landlines are 10 digits starting with 2.
fn is_valid_national(national: &str) -> bool {
    match national.as_bytes() {
        [prefix, second, ..] if national.len() == 9 => is_mobile_prefix(*prefix, *second),
        [b'2', ..] => national.len() == 10,
        _ => false,
    }
}

fn is_mobile_prefix(prefix: u8, second: u8) -> bool {
    match prefix {
        b'3' => matches!(second, b'2'..=b'9'),
        b'5' => matches!(second, b'2' | b'6' | b'8' | b'9'),
        b'7' => matches!(second, b'0' | b'6'..=b'9'),
        b'8' => matches!(second, b'1'..=b'9'),
        b'9' => second.is_ascii_digit(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_mobile() {
        assert_eq!(normalize_vn("0987654321").as_deref(), Some("+84987654321"));
        assert_eq!(normalize_vn("0912 345 678").as_deref(), Some("+84912345678"));
        assert_eq!(normalize_vn("035-123-4567").as_deref(), Some("+84351234567"));
    }

    #[test]
    fn international_forms() {
        assert_eq!(normalize_vn("+84987654321").as_deref(), Some("+84987654321"));
        assert_eq!(normalize_vn("84987654321").as_deref(), Some("+84987654321"));
        assert_eq!(normalize_vn("+84 (28) 3823 4567").as_deref(), Some("+842838234567"));
    }

    #[test]
    fn landline() {
        assert_eq!(normalize_vn("02838234567").as_deref(), Some("+842838234567"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(normalize_vn("12345"), None);
        assert_eq!(normalize_vn("1234567890"), None);
        assert_eq!(normalize_vn("+1 415 555 2671"), None);
        assert_eq!(normalize_vn("09876543x1"), None);
        assert_eq!(normalize_vn("0187654321"), None);
        assert_eq!(normalize_vn("+"), None);
    }

    #[test]
    fn unallocated_mobile_prefixes_are_rejected() {
        assert_eq!(normalize_vn("0301234567"), None);
        assert_eq!(normalize_vn("0501234567"), None);
        assert_eq!(normalize_vn("0711234567"), None);
        assert_eq!(normalize_vn("0801234567"), None);
        assert_eq!(normalize_vn("0561234567").as_deref(), Some("+84561234567"));
        assert_eq!(normalize_vn("0701234567").as_deref(), Some("+84701234567"));
        assert_eq!(normalize_vn("0891234567").as_deref(), Some("+84891234567"));
    }
}
