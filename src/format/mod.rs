// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Message formatting with positional placeholders.
//!
//! Templates use `{0}`, `{1}`, ... to refer to arguments, optionally with an alignment such as
//! `{0,7}` (right aligned) or `{0,-7}` (left aligned). Braces are escaped by doubling them.
//! Alignments are limited to less than a million characters.

use std::fmt;
use std::iter;
use std::panic;
use std::panic::AssertUnwindSafe;

mod arg;
mod render;

pub use self::arg::Arg;
pub use self::arg::Handle;
pub use self::render::RendererRegistry;

/// Why a template could not be formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A `}` without a matching `{`, or a `{` that is never closed.
    UnbalancedBrace {
        /// Byte offset in the template.
        position: usize,
    },
    /// A placeholder that is not `{index}` or `{index,alignment}`, or whose alignment is too wide.
    InvalidPlaceholder {
        /// Byte offset in the template.
        position: usize,
        /// The text between the braces.
        placeholder: String,
    },
    /// A placeholder referring to an argument that was not passed.
    MissingArgument {
        /// The referred index.
        index: usize,
        /// The number of arguments passed.
        count: usize,
    },
    /// Rendering an argument panicked.
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::UnbalancedBrace { position } => {
                write!(f, "unbalanced brace at position {position}")
            }
            FormatError::InvalidPlaceholder {
                position,
                placeholder,
            } => write!(f, "invalid placeholder '{{{placeholder}}}' at position {position}"),
            FormatError::MissingArgument { index, count } => write!(
                f,
                "placeholder {{{index}}} refers to a missing argument, {count} argument(s) given"
            ),
            FormatError::Panicked { message } => write!(f, "rendering panicked: {message}"),
        }
    }
}

impl std::error::Error for FormatError {}

/// Builds message text from a template and arguments.
///
/// Placeholders take an argument index and an optional alignment, nothing else. Format
/// specifiers such as `{0:0.00}` are not supported and make the call fall back; render the value
/// beforehand, e.g. `args![format!("{value:.2}")]`.
///
/// # Examples
///
/// ```
/// use logchan::args;
/// use logchan::format::Formatter;
///
/// let formatter = Formatter::default();
/// assert_eq!(formatter.format("{0} + {0} = {1}", args![1, 2]), "1 + 1 = 2");
///
/// // Formatting never fails; a broken call is embedded into the message.
/// let text = formatter.format("{0} and {1}", args!["only one"]);
/// assert!(text.starts_with("{0} and {1}"));
/// ```
#[derive(Debug, Default)]
pub struct Formatter {
    renderers: RendererRegistry,
}

impl Formatter {
    /// Create a formatter using the given renderers.
    pub fn new(renderers: RendererRegistry) -> Self {
        Self { renderers }
    }

    /// The renderers used to pre-render arguments.
    pub fn renderers(&self) -> &RendererRegistry {
        &self.renderers
    }

    /// Format the template, falling back to a plain rendering of the call if it is broken.
    ///
    /// A template without arguments is returned as is.
    pub fn format(&self, template: &str, args: &[Arg]) -> String {
        if args.is_empty() {
            return template.to_owned();
        }

        match self.try_format(template, args) {
            Ok(text) => text,
            Err(err) => fallback(template, args, &err),
        }
    }

    /// Format the template, reporting a broken call as an error.
    pub fn try_format(&self, template: &str, args: &[Arg]) -> Result<String, FormatError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            let rendered = args
                .iter()
                .map(|arg| self.renderers.render(arg).unwrap_or_else(|| arg.to_string()))
                .collect::<Vec<_>>();
            substitute(template, &rendered)
        }))
        .unwrap_or_else(|payload| {
            Err(FormatError::Panicked {
                message: panic_message(payload.as_ref()),
            })
        })
    }
}

fn substitute(template: &str, args: &[String]) -> Result<String, FormatError> {
    let mut text = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, c)| c == '{').is_some() {
                    text.push('{');
                    continue;
                }

                let mut placeholder = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => placeholder.push(c),
                        None => return Err(FormatError::UnbalancedBrace { position }),
                    }
                }

                let (index, alignment) = parse_placeholder(&placeholder).ok_or_else(|| {
                    FormatError::InvalidPlaceholder {
                        position,
                        placeholder: placeholder.clone(),
                    }
                })?;
                let arg = args.get(index).ok_or(FormatError::MissingArgument {
                    index,
                    count: args.len(),
                })?;
                push_aligned(&mut text, arg, alignment);
            }
            '}' => {
                if chars.next_if(|&(_, c)| c == '}').is_none() {
                    return Err(FormatError::UnbalancedBrace { position });
                }
                text.push('}');
            }
            c => text.push(c),
        }
    }

    Ok(text)
}

/// Alignments must be narrower than this.
const MAX_ALIGNMENT: u32 = 1_000_000;

fn parse_placeholder(placeholder: &str) -> Option<(usize, i32)> {
    let (index, alignment) = match placeholder.split_once(',') {
        Some((index, alignment)) => (index, alignment.trim().parse::<i32>().ok()?),
        None => (placeholder, 0),
    };
    if alignment.unsigned_abs() >= MAX_ALIGNMENT {
        return None;
    }
    let index = index.trim();
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((index.parse().ok()?, alignment))
}

fn push_aligned(text: &mut String, arg: &str, alignment: i32) {
    let width = alignment.unsigned_abs() as usize;
    let padding = width.saturating_sub(arg.chars().count());
    if alignment < 0 {
        text.push_str(arg);
        text.extend(iter::repeat_n(' ', padding));
    } else {
        text.extend(iter::repeat_n(' ', padding));
        text.push_str(arg);
    }
}

fn fallback(template: &str, args: &[Arg], err: &FormatError) -> String {
    let args = panic::catch_unwind(AssertUnwindSafe(|| {
        args.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }))
    .unwrap_or_else(|_| "(error in argument Display call)".to_string());

    format!("{template}\n{args}\nFormatError: {err}")
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
