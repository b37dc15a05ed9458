//! Recovers the first JSON object embedded in free-form model output.
//!
//! Model completions routinely wrap the object in prose or markdown fences, so
//! the scan looks for a `{`, follows it to the matching `}` (tracking nesting
//! depth and string literals), and hands that span to `serde_json`. A balanced
//! span that fails to parse is logged and skipped as a whole, so objects nested
//! inside it are never returned. An unterminated `{` only skips itself.

use serde_json::Value;

/// Returns the first well-formed top-level JSON object in `text`, or `None`.
///
/// Never fails: unparseable candidates are skipped.
pub fn extract_json(text: &str) -> Option<Value> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;

        let Some(len) = balanced_object_len(&text[start..]) else {
            // '{' 是單一位元組，start + 1 一定落在字元邊界上
            search_from = start + 1;
            continue;
        };

        let candidate = &text[start..start + len];
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) if value.is_object() => return Some(value),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("⚠️ JSON parse failed: {}", e);
                tracing::debug!("Rejected candidate: {}", candidate);
            }
        }

        // 結尾的 '}' 也是單一位元組
        search_from = start + len;
    }

    None
}

/// Length in bytes of the brace-balanced span starting at `s[0] == '{'`.
fn balanced_object_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, byte) in s.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
