use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*\}\}").expect("valid regex")
});

/// Scalar rendering of `{{ ... }}` tags against a JSON context.
pub trait ContextRenderer {
    fn render(&self, text: &str, context: &Value) -> String;
}

/// Replaces `{{ key }}` and dotted `{{ a.b.0 }}` tags. Unknown keys and
/// nulls render as empty strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagRenderer;

impl TagRenderer {
    pub fn new() -> Self {
        Self
    }

    fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
        path.split('.').try_fold(context, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        })
    }

    fn display(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        }
    }
}

impl ContextRenderer for TagRenderer {
    fn render(&self, text: &str, context: &Value) -> String {
        if !text.contains("{{") {
            return text.to_string();
        }
        TAG_PATTERN
            .replace_all(text, |caps: &Captures| {
                Self::lookup(context, &caps[1])
                    .map(Self::display)
                    .unwrap_or_default()
            })
            .into_owned()
    }
}
