//! Removal of structured records that leak into the narrative text.
//!
//! The backend occasionally echoes the raw shape of a student or course
//! record inside narrative tokens. Once a turn has invoked at least one
//! tool, every balanced `{...}`/`[...]` span that parses as JSON and looks
//! like one of those records is deleted from the rendered view.

use serde_json::Value;

/// Field names that identify a leaked record. A bare object is
/// record-shaped when at least three of its keys are on this list; an
/// array when it is empty or its first element is an object matching at
/// least two.
const RECORD_KEYS: [&str; 15] = [
    "id",
    "student_id",
    "student_name",
    "student_grade",
    "phone",
    "parent_contact",
    "progress",
    "notes",
    "title",
    "start",
    "end",
    "location",
    "price",
    "color",
    "description",
];

/// Candidates longer than this are left alone as a cost guard.
const MAX_CANDIDATE_LEN: usize = 20_000;

const OBJECT_SCORE_THRESHOLD: usize = 3;
const ARRAY_HEAD_SCORE_THRESHOLD: usize = 2;

const RULE_CHARS: [char; 6] = ['━', '─', '—', '-', '_', '='];
const RULE_MIN_LEN: usize = 8;

fn key_score(value: &Value) -> usize {
    match value.as_object() {
        Some(map) => map
            .keys()
            .filter(|key| RECORD_KEYS.contains(&key.as_str()))
            .count(),
        None => 0,
    }
}

fn is_record_shaped(value: &Value) -> bool {
    match value {
        Value::Array(items) => match items.first() {
            None => true,
            Some(head @ Value::Object(_)) => key_score(head) >= ARRAY_HEAD_SCORE_THRESHOLD,
            Some(_) => false,
        },
        Value::Object(_) => key_score(value) >= OBJECT_SCORE_THRESHOLD,
        _ => false,
    }
}

/// Find the byte index of the delimiter closing the aggregate that opens at
/// `start`.
///
/// The scan tracks string literals: backslash escapes are honored and
/// delimiter characters inside a quoted string never count. A closer that
/// does not match the innermost open aggregate is skipped; such a candidate
/// cannot parse as JSON anyway.
fn find_aggregate_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut stack = vec![match bytes[start] {
        b'{' => b'}',
        b'[' => b']',
        _ => return None,
    }];
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start + 1..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' if stack.last() == Some(&byte) => {
                stack.pop();
                if stack.is_empty() {
                    return Some(start + 1 + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Delete record-shaped JSON spans from `text`, then tidy the result.
///
/// Span deletion only runs when `enabled` is set (the turn has tool
/// history); the tidy pass always runs. Re-running the filter on its own
/// output yields the same output.
pub fn strip_leaked_records(text: &str, enabled: bool) -> String {
    let stripped = if enabled {
        delete_record_spans(text)
    } else {
        text.to_string()
    };
    tidy(&stripped)
}

fn delete_record_spans(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' || bytes[i] == b'[' {
            if let Some(end) = find_aggregate_end(text, i) {
                let candidate = &text[i..=end];
                if candidate.len() <= MAX_CANDIDATE_LEN {
                    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                        if is_record_shaped(&value) {
                            i = end + 1;
                            continue;
                        }
                    }
                }
            }
        }
        let ch = match text[i..].chars().next() {
            Some(ch) => ch,
            None => break,
        };
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn is_rule_line(line: &str) -> bool {
    let trimmed = line.trim_matches([' ', '\t']);
    trimmed.chars().count() >= RULE_MIN_LEN && trimmed.chars().all(|ch| RULE_CHARS.contains(&ch))
}

/// Cleanup after deletion: horizontal-rule-only lines become empty, runs of
/// two or more blank lines collapse to a single one, and the ends are
/// trimmed.
fn tidy(text: &str) -> String {
    fn flush<'a>(run: &mut Vec<&'a str>, collapsed: &mut Vec<&'a str>) {
        if run.len() >= 2 {
            collapsed.push("");
        } else {
            collapsed.append(run);
        }
        run.clear();
    }

    let mut collapsed: Vec<&str> = Vec::new();
    let mut blank_run: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = if is_rule_line(line) { "" } else { line };
        if line.trim().is_empty() {
            blank_run.push(line);
        } else {
            flush(&mut blank_run, &mut collapsed);
            collapsed.push(line);
        }
    }
    flush(&mut blank_run, &mut collapsed);

    collapsed.join("\n").trim().to_string()
}
