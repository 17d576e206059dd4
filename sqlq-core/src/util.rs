pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Longest prefix of `value` within `limit` bytes that ends on a char boundary.
pub fn truncated(value: &str, limit: usize) -> &str {
    if value.len() <= limit {
        return value;
    }
    let mut end = limit;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncated(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Sends the value through the channel and logs in case of error.
#[macro_export]
macro_rules! send_value {
    ($tx:ident, $value:expr) => {{
        if let Err(..) = $tx.send($value) {
            log::debug!("The receiver was dropped before the result was delivered");
        }
    }};
}

#[cfg(test)]
mod tests {
    use crate::separated_by;

    #[test]
    fn separator_only_between_written_items() {
        let mut out = String::from("(");
        separated_by(
            &mut out,
            ["a", "", "b"],
            |out, v| out.push_str(v),
            ", ",
        );
        out.push(')');
        assert_eq!(out, "(a, b)");
    }

    #[test]
    fn truncates() {
        let long = "x".repeat(600);
        let printed = format!("{}", truncate_long!(long));
        assert_eq!(printed.len(), 500);
        assert!(printed.ends_with("..."));
        assert_eq!(format!("{}", truncate_long!("SELECT 1")), "SELECT 1");
        let wide = "è".repeat(300);
        assert_eq!(format!("{}", truncate_long!(wide)).len(), 499);
    }
}
