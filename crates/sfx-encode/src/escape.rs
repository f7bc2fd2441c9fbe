/// Warehouse-safe identifiers are `[A-Za-z0-9]` plus the `.` we insert to
/// join a field to its type tag. Anything else is replaced, character by
/// character, with `_{hex codepoint}_` — stable so re-encoding the same
/// document produces byte-identical field names (§4.5's idempotence contract).
pub fn escape_field_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.push_str(&format!("_{:x}_", ch as u32));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_is_escaped_like_any_other_separator() {
        assert_eq!(escape_field_name("job_id"), "job_5f_id");
    }

    #[test]
    fn is_stable_across_calls() {
        let name = "weird name!";
        assert_eq!(escape_field_name(name), escape_field_name(name));
    }

    #[test]
    fn escapes_every_non_alphanumeric_character() {
        assert_eq!(escape_field_name("a.b"), "a_2e_b");
        assert_eq!(escape_field_name("a b"), "a_20_b");
    }
}
