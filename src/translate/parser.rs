// src/translate/parser.rs
// Total parser for `@Name: value` records in free-text model replies
//
// Model output is unstructured by nature, so nothing here fails: malformed
// fragments are dropped and the caller decides which fields are required.

use std::collections::HashMap;

/// Record delimiter: a line that starts with `@`
const RECORD_MARKER: &str = "\n@";

/// A boolean quality signal from a reply (`yes`/`no` value)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: String,
    pub value: bool,
}

/// Structured view of one model reply. Fields and flags never share a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    pub fields: HashMap<String, String>,
    /// Flags in the order their names first appeared in the reply
    pub flags: Vec<Flag>,
}

impl ParsedReply {
    /// Field value by exact (case-sensitive) name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Flag value by exact name
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.iter().find(|f| f.name == name).map(|f| f.value)
    }

    /// Number of flags that came back `yes`
    pub fn issue_count(&self) -> usize {
        self.flags.iter().filter(|f| f.value).count()
    }

    /// Names of the `yes` flags, in reply order
    pub fn active_flags(&self) -> Vec<String> {
        self.flags
            .iter()
            .filter(|f| f.value)
            .map(|f| f.name.clone())
            .collect()
    }
}

/// Parse a raw reply into fields and flags
pub fn parse(raw: &str) -> ParsedReply {
    // Pad so the first and last records are delimited like the rest
    let padded = format!("\n{}\n", raw);

    // First-seen order, last-seen value
    let mut order: Vec<String> = Vec::new();
    let mut records: HashMap<String, String> = HashMap::new();

    for chunk in padded.split(RECORD_MARKER) {
        let Some((name, value)) = split_record(chunk) else {
            continue;
        };
        if !records.contains_key(&name) {
            order.push(name.clone());
        }
        records.insert(name, value);
    }

    let mut reply = ParsedReply::default();
    for name in order {
        let Some(value) = records.remove(&name) else {
            continue;
        };
        match flag_value(&value) {
            Some(flag) => reply.flags.push(Flag { name, value: flag }),
            None => {
                reply.fields.insert(name, value);
            }
        }
    }

    reply
}

/// Split a record on its first colon; both halves must survive trimming
fn split_record(chunk: &str) -> Option<(String, String)> {
    let (name, value) = chunk.split_once(':')?;
    let name = trim_record_part(name);
    let value = trim_record_part(value);
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}

fn trim_record_part(part: &str) -> &str {
    part.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '{' | '}'))
}

fn flag_value(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}
