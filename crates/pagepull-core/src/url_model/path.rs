//! Filename safety checks for rendered file templates.

/// True if `name` is a single, non-special path component on Linux:
/// non-empty, no `/`, `\` or NUL, not `.` or `..`, at most 255 bytes (NAME_MAX).
pub fn is_safe_file_name(name: &str) -> bool {
    const NAME_MAX: usize = 255;

    !name.is_empty()
        && name.len() <= NAME_MAX
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_safe() {
        assert!(is_safe_file_name("1.png"));
        assert!(is_safe_file_name("page-007.jpg"));
        assert!(is_safe_file_name(".hidden"));
    }

    #[test]
    fn separators_and_reserved_are_unsafe() {
        assert!(!is_safe_file_name(""));
        assert!(!is_safe_file_name("."));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name("a/1.png"));
        assert!(!is_safe_file_name("a\\1.png"));
        assert!(!is_safe_file_name("a\01.png"));
    }

    #[test]
    fn overlong_is_unsafe() {
        assert!(!is_safe_file_name(&"x".repeat(256)));
        assert!(is_safe_file_name(&"x".repeat(255)));
    }
}
