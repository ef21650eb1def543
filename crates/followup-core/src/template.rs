//! Template rendering — expands `{{wait_time}}`, `{{time}}`, `{{date}}` and
//! `{{getvar::name}}` in the follow-up message template.

use std::fmt::Write;
use std::sync::OnceLock;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use regex_lite::{Captures, Regex};
use serde_json::Value;

use crate::config::{Config, DEFAULT_DATE_FORMAT, DEFAULT_TEMPLATE, DEFAULT_TIME_FORMAT};
use crate::variables::VariableLookup;

/// Wait label shown in the settings preview.
pub const PREVIEW_WAIT_LABEL: &str = "10s";

fn getvar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{getvar::([^}]+)\}\}").expect("valid getvar regex"))
}

/// Inputs of one render call.
pub struct RenderContext<'a> {
    pub wait_label: &'a str,
    pub now: DateTime<Local>,
    pub variables: &'a dyn VariableLookup,
}

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    time_format: String,
    date_format: String,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.into(),
            date_format: DEFAULT_DATE_FORMAT.into(),
        }
    }
}

impl TemplateRenderer {
    pub fn from_config(config: &Config) -> Self {
        Self {
            time_format: config.time_format.clone(),
            date_format: config.date_format.clone(),
        }
    }

    /// Run the four substitution passes in order. Unknown `{{...}}` tokens
    /// are left as they are.
    pub fn render(&self, template: &str, ctx: &RenderContext<'_>) -> String {
        let text = template
            .replace("{{wait_time}}", ctx.wait_label)
            .replace(
                "{{time}}",
                &format_or_default(&ctx.now, &self.time_format, DEFAULT_TIME_FORMAT),
            )
            .replace(
                "{{date}}",
                &format_or_default(&ctx.now, &self.date_format, DEFAULT_DATE_FORMAT),
            );

        getvar_re()
            .replace_all(&text, |caps: &Captures<'_>| {
                let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                ctx.variables
                    .lookup(name)
                    .map(|v| stringify(&v))
                    .unwrap_or_default()
            })
            .into_owned()
    }

    /// What the template would send right now, for the settings panel.
    pub fn preview(&self, template: &str, variables: &dyn VariableLookup) -> String {
        let template = if template.is_empty() {
            DEFAULT_TEMPLATE
        } else {
            template
        };
        self.render(
            template,
            &RenderContext {
                wait_label: PREVIEW_WAIT_LABEL,
                now: Local::now(),
                variables,
            },
        )
    }
}

/// Render with the default time/date formats.
pub fn render(
    template: &str,
    wait_label: &str,
    now: DateTime<Local>,
    variables: &dyn VariableLookup,
) -> String {
    TemplateRenderer::default().render(
        template,
        &RenderContext {
            wait_label,
            now,
            variables,
        },
    )
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// `now.format(fmt)` panics on `to_string()` for a bad pattern, so bad
/// patterns are rejected up front.
fn format_or_default(now: &DateTime<Local>, fmt: &str, fallback: &str) -> String {
    let mut out = String::new();
    let valid = !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error));
    if valid && write!(out, "{}", now.format(fmt)).is_ok() {
        return out;
    }
    out.clear();
    let _ = write!(out, "{}", now.format(fallback));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 0).single().unwrap()
    }

    fn vars(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_wait_time_and_getvar() {
        let tpl = "*{{wait_time}} passed. {{getvar::x}}*";

        let store = vars(&[("x", json!("5"))]);
        assert_eq!(render(tpl, "10s", fixed_now(), &store), "*10s passed. 5*");

        let empty = vars(&[]);
        assert_eq!(render(tpl, "10s", fixed_now(), &empty), "*10s passed. *");
    }

    #[test]
    fn test_time_and_date() {
        let out = render("{{time}} on {{date}}", "1m", fixed_now(), &vars(&[]));
        assert_eq!(out, "09:05 on 3/7/2026");
    }

    #[test]
    fn test_repeated_and_unknown_tokens() {
        let out = render(
            "{{wait_time}}/{{wait_time}} {{user}} {{getvar::}}",
            "2h",
            fixed_now(),
            &vars(&[]),
        );
        assert_eq!(out, "2h/2h {{user}} {{getvar::}}");
    }

    #[test]
    fn test_getvar_trims_name_and_stringifies() {
        let store = vars(&[
            ("count", json!(3)),
            ("flag", json!(true)),
            ("gone", Value::Null),
            ("list", json!([1, 2])),
            ("nested", json!(["a", [2, 3], null])),
            ("obj", json!({"k": 1})),
        ]);
        let out = render(
            "{{getvar:: count }}|{{getvar::flag}}|{{getvar::gone}}|{{getvar::list}}|{{getvar::nested}}|{{getvar::obj}}",
            "1s",
            fixed_now(),
            &store,
        );
        assert_eq!(out, "3|true||1,2|a,2,3,|{\"k\":1}");
    }

    #[test]
    fn test_invalid_format_falls_back() {
        let renderer = TemplateRenderer {
            time_format: "%Q".into(),
            date_format: "%Y".into(),
        };
        let store = vars(&[]);
        let out = renderer.render(
            "{{time}} {{date}}",
            &RenderContext {
                wait_label: "1s",
                now: fixed_now(),
                variables: &store,
            },
        );
        assert_eq!(out, "09:05 2026");
    }

    #[test]
    fn test_preview_uses_default_template_when_empty() {
        let out = TemplateRenderer::default().preview("", &vars(&[]));
        assert!(out.starts_with("*10s have passed."));
    }
}
