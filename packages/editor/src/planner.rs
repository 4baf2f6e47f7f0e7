//! Edit planning for syntax-aware insertion and removal.
//!
//! Inserting into or removing from JSON text has to keep the member list
//! well formed: separators appear exactly between members, never dangle,
//! and surrounding whitespace is rewritten rather than stacked. The
//! planner scans raw text around an edit point and produces the prefix,
//! suffix and replacement range that make that true. It knows nothing of
//! the model; the model turns plans into [`TextDocument`] edits.
//!
//! [`TextDocument`]: crate::document::TextDocument

/// A planned insertion: replace `offset..offset+length` with
/// `prefix + payload + suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    pub offset: usize,
    /// Whitespace run around the insertion point that the edit replaces.
    pub length: usize,
    pub prefix: String,
    pub suffix: String,
}

impl InsertPlan {
    /// Offset of the payload once the edit is applied.
    pub fn payload_offset(&self) -> usize {
        self.offset + self.prefix.len()
    }

    /// Payload length, given the total length of the inserted text.
    pub fn payload_length(&self, total: usize) -> usize {
        total - self.prefix.len() - self.suffix.len()
    }
}

/// Plans a JSON member insertion.
///
/// `insert_at` is the byte position to insert at; `None` means before the
/// document's closing brace (or at end of text when there is none).
/// `indent` is the column for a line-per-member layout; `None` lays the
/// member out inline with `", "` separators.
///
/// Scanning backward from the insertion point decides whether a separating
/// comma is needed before the payload: a `,`, `[` or `{` already present
/// means no. Scanning forward decides the same for after the payload,
/// looking for `,`, `]` or `}`. Both scans extend the replaced whitespace
/// run so reindentation never stacks blank space. A document with no brace
/// at all gets a top-level object synthesized around the payload.
pub fn plan_json_insert(content: &str, insert_at: Option<usize>, indent: Option<usize>) -> InsertPlan {
    let bytes = content.as_bytes();
    let open = content.find('{');
    let close = content.rfind('}');
    let insert_pos = insert_at.unwrap_or_else(|| close.unwrap_or(content.len()));

    let mut prefix: Option<String> = None;
    let mut suffix: Option<String> = None;

    match open {
        Some(open) => {
            if close.map_or(true, |c| c < open) {
                suffix = Some("\n}".to_string());
            }
        }
        None => {
            // No object at all; synthesize one around the payload.
            let pad = " ".repeat(indent.unwrap_or(0));
            prefix = Some(format!("{{\n{pad}"));
            if close.is_none() {
                suffix = Some("\n}".to_string());
            }
        }
    }

    let mut replace = 0usize;
    let offset;
    if prefix.is_some() {
        offset = insert_pos;
    } else {
        let mut idx = insert_pos as isize;
        let mut needs_comma = true;
        loop {
            idx -= 1;
            if idx < 0 {
                break;
            }
            let c = bytes[idx as usize];
            if c == b',' || c == b'[' || c == b'{' {
                needs_comma = false;
                break;
            }
            if !c.is_ascii_whitespace() {
                break;
            }
            replace += 1;
        }
        offset = (idx + 1) as usize;
        prefix = Some(match indent {
            None => {
                if needs_comma {
                    ", ".to_string()
                } else {
                    String::new()
                }
            }
            Some(indent) => {
                let mut out = String::new();
                if needs_comma {
                    out.push(',');
                }
                out.push('\n');
                out.push_str(&" ".repeat(indent));
                out
            }
        });
    }

    if suffix.is_none() {
        let mut needs_comma = true;
        let mut idx = insert_pos;
        while idx < bytes.len() {
            let c = bytes[idx];
            if c == b',' || c == b']' || c == b'}' {
                needs_comma = false;
                break;
            }
            if !c.is_ascii_whitespace() {
                break;
            }
            replace += 1;
            idx += 1;
        }
        suffix = Some(match indent {
            None => {
                if needs_comma {
                    ", ".to_string()
                } else {
                    String::new()
                }
            }
            Some(indent) => {
                let mut out = String::new();
                // Without a trailing comma the next line holds the closing
                // bracket, which sits two columns out.
                let pad = if needs_comma {
                    out.push(',');
                    indent as isize
                } else {
                    indent as isize - 2
                };
                out.push('\n');
                if pad > 0 {
                    out.push_str(&" ".repeat(pad as usize));
                }
                out
            }
        });
    }

    InsertPlan {
        offset,
        length: replace,
        prefix: prefix.unwrap_or_default(),
        suffix: suffix.unwrap_or_default(),
    }
}

/// Plans the removal of `offset..offset+length` so no dangling separator
/// survives. Prefers absorbing a preceding comma, plus the whitespace
/// between it and the removed text; when there is none, absorbs a trailing
/// comma instead. An entry on a line of its own, with no comma either
/// side, takes its separating newline with it. Returns the widened range,
/// or `None` when the input range is out of bounds.
pub fn plan_removal(content: &str, offset: usize, length: usize) -> Option<(usize, usize)> {
    let bytes = content.as_bytes();
    let end = offset.checked_add(length)?;
    if end > bytes.len() {
        return None;
    }

    let mut start = offset;
    let mut len = length;

    // Preceding comma, looking back across whitespace.
    let mut idx = offset as isize;
    let mut leading_comma = None;
    loop {
        idx -= 1;
        if idx < 0 {
            break;
        }
        let c = bytes[idx as usize];
        if c == b',' {
            leading_comma = Some(idx as usize);
            break;
        }
        if !c.is_ascii_whitespace() {
            break;
        }
    }

    if let Some(comma) = leading_comma {
        start = comma;
        len += offset - start;
        return Some((start, len));
    }

    // No preceding comma; try a trailing one.
    let mut idx = end;
    while idx < bytes.len() {
        let c = bytes[idx];
        if c == b',' {
            len = idx + 1 - start;
            return Some((start, len));
        }
        if !c.is_ascii_whitespace() {
            break;
        }
        idx += 1;
    }

    // No comma either side. An entry alone on its line gives up one of
    // its separating newlines so no blank line is left behind.
    let ends_line = end == bytes.len() || bytes[end] == b'\n';
    if ends_line {
        if offset > 0 && bytes[offset - 1] == b'\n' {
            start = offset - 1;
            len += 1;
        } else if offset == 0 && end < bytes.len() {
            len += 1;
        }
    }

    Some((start, len))
}

/// Insertion point for appending to a DSL call list: directly after the
/// given call, past its line's newline when there is one. With no call to
/// group after, appends at end of text.
pub fn dsl_append_pos(content: &str, after: Option<(usize, usize)>) -> usize {
    match after {
        None => content.len(),
        Some((offset, length)) => {
            let mut pos = offset + length;
            if pos < content.len() && content.as_bytes()[pos] == b'\n' {
                pos += 1;
            }
            pos
        }
    }
}

/// Insertion point inside an existing JSON array: after the last non-space
/// character before the array's closing bracket. `container_end` is the
/// end offset of the span covering the whole `"key": [ ... ]` member.
pub fn json_array_append_pos(content: &str, container_end: usize) -> usize {
    let bytes = content.as_bytes();
    if bytes.is_empty() {
        return 0;
    }
    let mut last = container_end.min(bytes.len() - 1) as isize;
    while last >= 0 && bytes[last as usize] != b']' {
        last -= 1;
    }
    loop {
        last -= 1;
        if last < 0 || !bytes[last as usize].is_ascii_whitespace() {
            break;
        }
    }
    (last + 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(content: &str, plan: &InsertPlan, payload: &str) -> String {
        let mut out = String::new();
        out.push_str(&content[..plan.offset]);
        out.push_str(&plan.prefix);
        out.push_str(payload);
        out.push_str(&plan.suffix);
        out.push_str(&content[plan.offset + plan.length..]);
        out
    }

    #[test]
    fn test_insert_into_empty_object() {
        let content = "{}";
        let plan = plan_json_insert(content, None, Some(2));
        let out = apply(content, &plan, "\"version\": \"1.0.0\"");
        assert_eq!(out, "{\n  \"version\": \"1.0.0\"\n}");
    }

    #[test]
    fn test_insert_after_existing_member_adds_leading_comma() {
        let content = "{\n  \"name\": \"a/b\"\n}";
        let plan = plan_json_insert(content, None, Some(2));
        let out = apply(content, &plan, "\"version\": \"1.0.0\"");
        assert_eq!(out, "{\n  \"name\": \"a/b\",\n  \"version\": \"1.0.0\"\n}");
    }

    #[test]
    fn test_insert_into_empty_text_synthesizes_object() {
        let content = "";
        let plan = plan_json_insert(content, None, Some(2));
        let out = apply(content, &plan, "\"name\": \"a/b\"");
        assert_eq!(out, "{\n  \"name\": \"a/b\"\n}");
    }

    #[test]
    fn test_insert_before_following_member_adds_trailing_comma() {
        let content = "{\n  \"name\": \"a/b\"\n}";
        // Right after the opening brace, before "name".
        let plan = plan_json_insert(content, Some(1), Some(2));
        let out = apply(content, &plan, "\"version\": \"1.0.0\"");
        assert_eq!(out, "{\n  \"version\": \"1.0.0\",\n  \"name\": \"a/b\"\n}");
    }

    #[test]
    fn test_inline_insert_into_empty_array() {
        let content = "{\"tags\": []}";
        let plan = plan_json_insert(content, Some(10), None);
        let out = apply(content, &plan, "\"web\"");
        assert_eq!(out, "{\"tags\": [\"web\"]}");
    }

    #[test]
    fn test_inline_insert_after_last_element() {
        let content = "{\"tags\": [\"web\"]}";
        let plan = plan_json_insert(content, Some(15), None);
        let out = apply(content, &plan, "\"proxy\"");
        assert_eq!(out, "{\"tags\": [\"web\", \"proxy\"]}");
    }

    #[test]
    fn test_removal_absorbs_preceding_comma() {
        let content = "[\"a\", \"b\"]";
        // Remove "b" at 6..9.
        let (start, len) = plan_removal(content, 6, 3).unwrap();
        let mut out = content.to_string();
        out.replace_range(start..start + len, "");
        assert_eq!(out, "[\"a\"]");
    }

    #[test]
    fn test_removal_of_first_element_absorbs_trailing_comma() {
        let content = "[\"a\", \"b\"]";
        // Remove "a" at 1..4.
        let (start, len) = plan_removal(content, 1, 3).unwrap();
        let mut out = content.to_string();
        out.replace_range(start..start + len, "");
        assert_eq!(out, "[ \"b\"]");
    }

    #[test]
    fn test_removal_of_call_line_absorbs_preceding_newline() {
        let content = "name 'a/b'\nversion '1.0.0'\nlicense 'MIT'\n";
        // Remove the version call at 11..26.
        let (start, len) = plan_removal(content, 11, 15).unwrap();
        let mut out = content.to_string();
        out.replace_range(start..start + len, "");
        assert_eq!(out, "name 'a/b'\nlicense 'MIT'\n");
    }

    #[test]
    fn test_removal_out_of_bounds_is_none() {
        assert_eq!(plan_removal("abc", 2, 5), None);
    }

    #[test]
    fn test_dsl_append_pos_steps_past_newline() {
        let content = "dependency 'a/b'\nlicense 'MIT'\n";
        assert_eq!(dsl_append_pos(content, Some((0, 16))), 17);
        assert_eq!(dsl_append_pos(content, None), content.len());
    }

    #[test]
    fn test_json_array_append_pos() {
        let content = "\"tags\": [\"web\"\n]";
        assert_eq!(json_array_append_pos(content, content.len()), 14);
        let empty = "\"tags\": [\n  ]";
        assert_eq!(json_array_append_pos(empty, empty.len()), 9);
    }
}
