//! Display templates for [`SmoothedValue`](super::SmoothedValue).
//!
//! A template is literal text with `{stat}` or `{stat:.N}` placeholders,
//! where `stat` is one of `median`, `avg`, `global_avg`, `max`, `value`.
//! A trailing `f` on the precision (`{avg:.4f}`) is accepted. Braces are
//! escaped by doubling them.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::error::MetricError;

/// Template used when a meter is created without one.
pub const DEFAULT_TEMPLATE: &str = "{median:.4f} ({global_avg:.4f})";

/// Statistic that a placeholder refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stat {
    Median,
    Avg,
    GlobalAvg,
    Max,
    Value,
}

impl Stat {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "median" => Some(Stat::Median),
            "avg" => Some(Stat::Avg),
            "global_avg" => Some(Stat::GlobalAvg),
            "max" => Some(Stat::Max),
            "value" => Some(Stat::Value),
            _ => None,
        }
    }

    /// Placeholder name of this statistic.
    pub fn name(self) -> &'static str {
        match self {
            Stat::Median => "median",
            Stat::Avg => "avg",
            Stat::GlobalAvg => "global_avg",
            Stat::Max => "max",
            Stat::Value => "value",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field { stat: Stat, precision: Option<usize> },
}

/// A parsed display template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template, rejecting unknown statistics and malformed specs.
    pub fn parse(source: &str) -> Result<Self, MetricError> {
        let invalid = |reason: &str| MetricError::InvalidFormat {
            template: source.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unmatched '}'")),
                '{' => {
                    let mut field = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        field.push(inner);
                    }
                    if !closed {
                        return Err(invalid("unclosed '{'"));
                    }

                    let (name, spec) = match field.split_once(':') {
                        Some((name, spec)) => (name, Some(spec)),
                        None => (field.as_str(), None),
                    };
                    let stat = Stat::parse(name.trim())
                        .ok_or_else(|| invalid(&format!("unknown field '{name}'")))?;
                    let precision = match spec {
                        None | Some("") => None,
                        Some(spec) => Some(parse_precision(spec).ok_or_else(|| {
                            invalid(&format!("unsupported format spec '{spec}'"))
                        })?),
                    };

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field { stat, precision });
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Template rendering a single statistic, e.g. `{avg:.4f}`.
    pub fn single(stat: Stat, precision: Option<usize>) -> Self {
        let source = match precision {
            Some(p) => format!("{{{}:.{p}f}}", stat.name()),
            None => format!("{{{}}}", stat.name()),
        };
        Self {
            source,
            segments: vec![Segment::Field { stat, precision }],
        }
    }

    /// The original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Statistics referenced by this template, in order of appearance.
    pub fn stats(&self) -> impl Iterator<Item = Stat> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field { stat, .. } => Some(*stat),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template, resolving each placeholder through `lookup`.
    ///
    /// `lookup` is only called for statistics the template mentions.
    pub fn render<F>(&self, mut lookup: F) -> Result<String, MetricError>
    where
        F: FnMut(Stat) -> Result<f64, MetricError>,
    {
        let mut out = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { stat, precision } => {
                    let value = lookup(*stat)?;
                    // Writing into a String cannot fail.
                    let _ = match precision {
                        Some(p) => write!(out, "{value:.p$}"),
                        None => write!(out, "{value}"),
                    };
                }
            }
        }
        Ok(out)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
            segments: vec![
                Segment::Field {
                    stat: Stat::Median,
                    precision: Some(4),
                },
                Segment::Literal(" (".to_string()),
                Segment::Field {
                    stat: Stat::GlobalAvg,
                    precision: Some(4),
                },
                Segment::Literal(")".to_string()),
            ],
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for Template {
    type Error = MetricError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Template::parse(&source)
    }
}

impl From<Template> for String {
    fn from(template: Template) -> Self {
        template.source
    }
}

fn parse_precision(spec: &str) -> Option<usize> {
    let digits = spec.strip_prefix('.')?;
    let digits = digits.strip_suffix('f').unwrap_or(digits);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
