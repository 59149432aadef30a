//! Content normalization applied before two files are compared.
//!
//! Comments are always removed so that documentation-only edits do not count
//! as modifications. Removal is done by a small lexical scanner that follows
//! PHP's tokenizer modes: text outside `<?php ... ?>` is inline text and only
//! loses Blade `{{-- --}}` comments, while code loses `/* */`, `//` and `#`
//! comments. String literals (single, double, backtick, heredoc and nowdoc)
//! are copied untouched, so a URL or a colour code inside a string survives.

/// Characters PHP's `trim()` removes by default
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// How content is normalized before comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationPolicy {
    /// Also strip the open tag, unify line endings and collapse whitespace
    pub whitespace: bool,
}

impl NormalizationPolicy {
    pub fn new(whitespace: bool) -> Self {
        Self { whitespace }
    }
}

/// Normalize raw file content according to the policy.
pub fn normalize(raw: &str, policy: NormalizationPolicy) -> String {
    let stripped = strip_comments(raw);
    if policy.whitespace {
        normalize_whitespace(&stripped)
    } else {
        stripped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    InlineText,
    Code,
}

/// Remove every comment from PHP / Blade content, leaving literals intact.
pub fn strip_comments(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut mode = Mode::InlineText;
    let mut i = 0;

    while i < bytes.len() {
        match mode {
            Mode::InlineText => {
                if let Some(tag_len) = open_tag_len(&bytes[i..]) {
                    out.extend_from_slice(&bytes[i..i + tag_len]);
                    i += tag_len;
                    mode = Mode::Code;
                } else if bytes[i..].starts_with(b"{{--") {
                    match find(bytes, i + 4, b"--}}") {
                        Some(end) => i = end + 4,
                        None => {
                            // Unterminated Blade comment is left as text
                            out.extend_from_slice(&bytes[i..]);
                            i = bytes.len();
                        }
                    }
                } else {
                    out.push(bytes[i]);
                    i += 1;
                }
            }
            Mode::Code => {
                let rest = &bytes[i..];
                if rest.starts_with(b"?>") {
                    out.extend_from_slice(b"?>");
                    i += 2;
                    mode = Mode::InlineText;
                } else if rest.starts_with(b"/*") {
                    i = find(bytes, i + 2, b"*/").map_or(bytes.len(), |end| end + 2);
                } else if rest.starts_with(b"//") || (rest[0] == b'#' && rest.get(1) != Some(&b'[')) {
                    trim_trailing_blanks(&mut out);
                    i = line_comment_end(bytes, i);
                } else if rest.starts_with(b"<<<") {
                    let end = heredoc_end(bytes, i).unwrap_or(i + 3);
                    out.extend_from_slice(&bytes[i..end]);
                    i = end;
                } else if matches!(rest[0], b'\'' | b'"' | b'`') {
                    let end = quoted_end(bytes, i);
                    out.extend_from_slice(&bytes[i..end]);
                    i = end;
                } else {
                    out.push(bytes[i]);
                    i += 1;
                }
            }
        }
    }

    // Only whole ASCII delimited ranges were removed, so this cannot fail
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Strip the leading open tag, unify line endings, collapse runs of spaces
/// and tabs, then trim.
pub fn normalize_whitespace(s: &str) -> String {
    let leading = s.trim_start();
    let s = match leading.strip_prefix("<?php") {
        Some(rest) => rest.trim_start(),
        None => s,
    };

    let s = s.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(s.len());
    let mut in_blank_run = false;
    for c in s.chars() {
        if c == ' ' || c == '\t' {
            if !in_blank_run {
                out.push(' ');
            }
            in_blank_run = true;
        } else {
            out.push(c);
            in_blank_run = false;
        }
    }

    out.trim_matches(TRIM_CHARS).to_string()
}

/// Length of a `<?php`, `<?=` or short `<?` tag at the start of `rest`.
///
/// `<?xml` declarations are not tags.
fn open_tag_len(rest: &[u8]) -> Option<usize> {
    if !rest.starts_with(b"<?") {
        return None;
    }
    if rest.starts_with(b"<?=") {
        return Some(3);
    }
    if rest.len() >= 5 && rest[..5].eq_ignore_ascii_case(b"<?php") {
        match rest.get(5) {
            None => return Some(5),
            Some(c) if c.is_ascii_whitespace() => return Some(5),
            _ => {}
        }
    }
    if rest.len() >= 5 && rest[2..5].eq_ignore_ascii_case(b"xml") {
        return None;
    }
    Some(2)
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Drop spaces and tabs at the end of the current output line
fn trim_trailing_blanks(out: &mut Vec<u8>) {
    while matches!(out.last(), Some(b' ') | Some(b'\t')) {
        out.pop();
    }
}

/// A line comment runs up to (not including) the newline or a closing `?>`
fn line_comment_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'\n' || bytes[i] == b'\r' || bytes[i..].starts_with(b"?>") {
            return i;
        }
        i += 1;
    }
    bytes.len()
}

/// End (exclusive) of the quoted literal starting at `start`.
///
/// Double-quoted and backtick strings may contain `{$ ... }` interpolation
/// blocks, which can themselves hold quoted strings.
pub(crate) fn quoted_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let interpolates = quote != b'\'';
    let mut i = start + 1;

    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\\' {
            i += 2;
            continue;
        }
        if c == quote {
            return i + 1;
        }
        if interpolates && bytes[i..].starts_with(b"{$") {
            i = interpolation_end(bytes, i + 1);
            continue;
        }
        i += 1;
    }
    bytes.len()
}

/// Skip a `{$ ... }` block whose opening brace sits at `open - 1`
fn interpolation_end(bytes: &[u8], open: usize) -> usize {
    let mut depth = 1;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            b'\'' | b'"' => {
                i = quoted_end(bytes, i);
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// End (exclusive) of a heredoc/nowdoc starting with `<<<` at `start`.
///
/// Returns `None` when no valid label follows, in which case `<<<` is
/// ordinary code.
pub(crate) fn heredoc_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 3;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }

    let quote = match bytes.get(i) {
        Some(&q @ (b'\'' | b'"')) => {
            i += 1;
            Some(q)
        }
        _ => None,
    };

    let label_start = i;
    while i < bytes.len() && is_label_byte(bytes[i], i == label_start) {
        i += 1;
    }
    if i == label_start {
        return None;
    }
    let label = &bytes[label_start..i];

    if let Some(q) = quote {
        if bytes.get(i) != Some(&q) {
            return None;
        }
        i += 1;
    }

    // Label line must end right away
    match bytes.get(i) {
        Some(b'\n') => i += 1,
        Some(b'\r') => {
            i += 1;
            if bytes.get(i) == Some(&b'\n') {
                i += 1;
            }
        }
        _ => return None,
    }

    // Closing label: first line whose indented content starts with the label
    // and is not followed by another label character.
    while i < bytes.len() {
        let mut j = i;
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
        if bytes[j..].starts_with(label) {
            let after = j + label.len();
            if bytes.get(after).map_or(true, |&b| !is_label_byte(b, false)) {
                return Some(after);
            }
        }
        match find(bytes, i, b"\n") {
            Some(nl) => i = nl + 1,
            None => break,
        }
    }
    Some(bytes.len())
}

pub(crate) fn is_label_byte(b: u8, first: bool) -> bool {
    b == b'_' || b.is_ascii_alphabetic() || b >= 0x80 || (!first && b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments_removes_block_comments() {
        let stripped = strip_comments("<?php\n/* This is a comment */\necho 'test';");
        assert!(!stripped.contains("This is a comment"));
        assert!(stripped.contains("echo 'test';"));
    }

    #[test]
    fn test_strip_comments_removes_doc_blocks() {
        let stripped = strip_comments("<?php\n/**\n * Docs\n * @var int\n */\n$a = 1;");
        assert_eq!(stripped, "<?php\n\n$a = 1;");
    }

    #[test]
    fn test_strip_comments_removes_line_comments() {
        let stripped = strip_comments("<?php\n// This is a comment\necho 'test';");
        assert!(!stripped.contains("This is a comment"));
        assert!(stripped.contains("echo 'test';"));
    }

    #[test]
    fn test_strip_comments_removes_hash_comments() {
        let stripped = strip_comments("<?php\n# This is a comment\necho 'test';");
        assert!(!stripped.contains("This is a comment"));
        assert!(stripped.contains("echo 'test';"));
    }

    #[test]
    fn test_strip_comments_removes_blanks_before_trailing_comment() {
        let stripped = strip_comments("<?php\n$a = 1;   // one\n$b = 2;\t# two\n");
        assert_eq!(stripped, "<?php\n$a = 1;\n$b = 2;\n");
    }

    #[test]
    fn test_strip_comments_preserves_urls_in_strings() {
        let stripped =
            strip_comments("<?php\n// Comment\n$url = 'https://example.com/path';");
        assert!(!stripped.contains("// Comment"));
        assert!(stripped.contains("https://example.com/path"));
    }

    #[test]
    fn test_strip_comments_preserves_hash_in_strings() {
        let stripped = strip_comments("<?php\n# Comment\n$color = '#FF5733';");
        assert!(!stripped.contains("# Comment"));
        assert!(stripped.contains("#FF5733"));
    }

    #[test]
    fn test_strip_comments_preserves_double_slash_in_strings() {
        let stripped = strip_comments("<?php\n// This is a comment\n$path = 'path//to//file';");
        assert!(!stripped.contains("This is a comment"));
        assert!(stripped.contains("path//to//file"));
    }

    #[test]
    fn test_strip_comments_preserves_block_markers_in_strings() {
        let src = "<?php\n$glob = \"app/*/config/*.php\";";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn test_strip_comments_handles_escaped_quotes() {
        let src = "<?php\n$a = 'it\\'s // here'; // gone\n";
        assert_eq!(strip_comments(src), "<?php\n$a = 'it\\'s // here';\n");
    }

    #[test]
    fn test_strip_comments_handles_interpolation() {
        let src = "<?php\n$a = \"{$map[\"k\"]} // kept\"; // gone";
        assert_eq!(strip_comments(src), "<?php\n$a = \"{$map[\"k\"]} // kept\";");
    }

    #[test]
    fn test_strip_comments_preserves_heredoc_body() {
        let src = "<?php\n$sql = <<<SQL\nSELECT 1 -- // not a comment\n# still text\nSQL;\n// gone\n";
        assert_eq!(
            strip_comments(src),
            "<?php\n$sql = <<<SQL\nSELECT 1 -- // not a comment\n# still text\nSQL;\n\n"
        );
    }

    #[test]
    fn test_strip_comments_preserves_nowdoc_body() {
        let src = "<?php\n$t = <<<'EOT'\n  /* raw */\n  EOT;\n";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn test_strip_comments_keeps_attributes() {
        let src = "<?php\n#[Attribute]\nclass A {}\n";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn test_strip_comments_leaves_inline_text_alone() {
        let src = "<a href=\"https://example.com\"># top</a>\n<?php echo 1; // c ?>\n<p>//</p>";
        assert_eq!(
            strip_comments(src),
            "<a href=\"https://example.com\"># top</a>\n<?php echo 1;?>\n<p>//</p>"
        );
    }

    #[test]
    fn test_strip_comments_in_short_tag_code() {
        assert_eq!(strip_comments("<? return 1; // vendor note\n"), "<? return 1;\n");
        assert_eq!(
            strip_comments("<p>a</p><? /* x */ echo 1; ?># b"),
            "<p>a</p><?  echo 1; ?># b"
        );
        let policy = NormalizationPolicy::default();
        assert_eq!(
            normalize("<? return 1; // vendor note\n", policy),
            normalize("<? return 1;\n", policy)
        );
    }

    #[test]
    fn test_strip_comments_keeps_xml_declaration_as_text() {
        let src = "<?xml version=\"1.0\"?>\n<feed># not code // either</feed>";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn test_strip_comments_removes_blade_comments() {
        let src = "<div>{{-- note --}}{{ $title }}</div>";
        assert_eq!(strip_comments(src), "<div>{{ $title }}</div>");
    }

    #[test]
    fn test_strip_comments_unterminated_block_runs_to_end() {
        assert_eq!(strip_comments("<?php\n$a = 1; /* open"), "<?php\n$a = 1; ");
    }

    #[test]
    fn test_strip_comments_is_deterministic() {
        let src = "<?php\n// a\nreturn ['x' => 1]; # b\n";
        assert_eq!(strip_comments(src), strip_comments(src));
    }

    #[test]
    fn test_normalize_whitespace_removes_php_tags() {
        let normalized = normalize_whitespace("<?php\necho 'test';");
        assert!(!normalized.contains("<?php"));
        assert_eq!(normalized, "echo 'test';");
    }

    #[test]
    fn test_normalize_whitespace_normalizes_line_endings() {
        let normalized = normalize_whitespace("line1\r\nline2\rline3\nline4");
        assert_eq!(normalized, "line1\nline2\nline3\nline4");
    }

    #[test]
    fn test_normalize_whitespace_converts_tabs_to_spaces() {
        let normalized = normalize_whitespace("line1\t\tline2  \t line3");
        assert_eq!(normalized, "line1 line2 line3");
    }

    #[test]
    fn test_normalize_whitespace_trims() {
        assert_eq!(normalize_whitespace("  \n value \n\n"), "value");
    }

    #[test]
    fn test_normalize_combines_comment_and_whitespace_policy() {
        let vendor = "<?php\n\n// Vendor docs\nreturn [\n    'a' => 1,\n];\n";
        let local = "<?php\r\nreturn [\r\n\t'a' => 1, // tweak later\r\n];";
        let policy = NormalizationPolicy::new(true);
        assert_eq!(normalize(vendor, policy), normalize(local, policy));
    }

    #[test]
    fn test_normalize_without_whitespace_policy_keeps_layout() {
        let policy = NormalizationPolicy::default();
        assert_eq!(normalize("<?php\n\treturn 1;", policy), "<?php\n\treturn 1;");
    }
}
