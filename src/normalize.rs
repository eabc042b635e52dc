//! Text cleanup applied to every block before chunking.

/// Remove digit-group separators from numbers.
///
/// A comma is dropped only when the characters directly before and after
/// it are both ASCII digits, so list separators and trailing commas
/// survive. Everything else is left untouched.
///
/// # Examples
///
/// ```
/// use finqa::normalize::normalize_numeric_tokens;
///
/// assert_eq!(normalize_numeric_tokens("Revenue: 1,234,567"), "Revenue: 1234567");
/// assert_eq!(normalize_numeric_tokens("1, 2, 3"), "1, 2, 3");
/// ```
pub fn normalize_numeric_tokens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        if c == ','
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(char::is_ascii_digit)
        {
            continue;
        }
        out.push(c);
    }

    out
}
