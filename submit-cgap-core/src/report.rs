//! Displaying sections of an ingestion submission to the user.

use serde_json::Value;

use crate::contract::Console;

/// A named section of a submission result: either top level or nested under
/// `additional_data`.
pub fn get_section<'a>(res: &'a Value, section: &str) -> Option<&'a Value> {
    res.get(section)
        .or_else(|| res.get("additional_data").and_then(|data| data.get(section)))
}

/// Show one section under a `----- Title -----` header.
///
/// A caveat marks output that is partial because processing did not succeed;
/// with a caveat, an empty section is not shown at all.
pub fn show_section<C: Console + ?Sized>(
    console: &C,
    res: &Value,
    section: &str,
    caveat_outcome: Option<&str>,
) {
    let data = get_section(res, section).filter(|value| !is_empty(value));
    if caveat_outcome.is_some() && data.is_none() {
        return;
    }
    let caveat = caveat_outcome
        .map(|outcome| format!(" (prior to {outcome})"))
        .unwrap_or_default();
    console.show(&format!("----- {}{caveat} -----", section_title(section)));
    match data {
        None => console.show("Nothing to show."),
        Some(Value::Array(lines)) => {
            for line in lines {
                console.show(&display_value(line));
            }
        }
        Some(object @ Value::Object(_)) => {
            let pretty = serde_json::to_string_pretty(object).unwrap_or_else(|_| object.to_string());
            console.show(&pretty);
        }
        Some(other) => console.show(&display_value(other)),
    }
}

/// `"1 file"`, `"2 files"`.
pub fn n_of(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Text of a JSON value as a user would expect to read it: strings without quotes.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Null, false, zero, and empty strings, lists and objects carry nothing worth showing.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn section_title(section: &str) -> String {
    section
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
