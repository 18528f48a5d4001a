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


use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// A handle to an object living outside of the logging system, such as a scene object or a
/// connection. When passed as a format argument, the first handle becomes the context of the
/// entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    kind: Cow<'static, str>,
    name: String,
    id: u64,
}

impl Handle {
    /// Create a new handle.
    pub fn new(kind: impl Into<Cow<'static, str>>, name: impl Into<String>, id: u64) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            id,
        }
    }

    /// What sort of object this handle refers to.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The display name of the object.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identity of the object.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A format argument.
#[derive(Clone)]
pub enum Arg {
    /// Text.
    Str(Cow<'static, str>),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A character.
    Char(char),
    /// An error, rendered with its source chain.
    Error(Arc<dyn std::error::Error + Send + Sync + 'static>),
    /// A handle to an external object.
    Handle(Handle),
    /// A source location, as captured by `#[track_caller]`.
    Location(&'static Location<'static>),
    /// Any displayable value.
    Display(Arc<dyn fmt::Display + Send + Sync + 'static>),
}

impl Arg {
    /// Wrap any displayable value.
    pub fn display(value: impl fmt::Display + Send + Sync + 'static) -> Self {
        Arg::Display(Arc::new(value))
    }

    /// Wrap an error.
    pub fn error(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Arg::Error(Arc::new(err))
    }

    /// The location of the caller.
    #[track_caller]
    pub fn caller() -> Self {
        Arg::Location(Location::caller())
    }

    /// The handle, if this argument is one.
    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Arg::Handle(handle) => Some(handle),
            _ => None,
        }
    }

    /// The text, if this argument is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => f.write_str(s),
            Arg::Int(n) => fmt::Display::fmt(n, f),
            Arg::UInt(n) => fmt::Display::fmt(n, f),
            Arg::Float(n) => fmt::Display::fmt(n, f),
            Arg::Bool(b) => fmt::Display::fmt(b, f),
            Arg::Char(c) => fmt::Display::fmt(c, f),
            Arg::Error(err) => fmt::Display::fmt(err, f),
            Arg::Handle(handle) => write!(f, "{} {}", handle.kind, handle.name),
            Arg::Location(location) => fmt::Display::fmt(location, f),
            Arg::Display(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Arg::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Arg::UInt(n) => f.debug_tuple("UInt").field(n).finish(),
            Arg::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Arg::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Arg::Char(c) => f.debug_tuple("Char").field(c).finish(),
            Arg::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
            Arg::Handle(handle) => f.debug_tuple("Handle").field(handle).finish(),
            Arg::Location(location) => f.debug_tuple("Location").field(location).finish(),
            Arg::Display(value) => f.debug_tuple("Display").field(&value.to_string()).finish(),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(Cow::Owned(value.to_owned()))
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(Cow::Owned(value))
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Str(Cow::Owned(value.clone()))
    }
}

impl From<Cow<'static, str>> for Arg {
    fn from(value: Cow<'static, str>) -> Self {
        Arg::Str(value)
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for Arg {
                fn from(value: $source) -> Self {
                    Arg::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

impl_from_int!(Int, i64, i8, i16, i32, i64);
impl_from_int!(UInt, u64, u8, u16, u32, u64);
impl_from_int!(Float, f64, f32, f64);

impl From<usize> for Arg {
    fn from(value: usize) -> Self {
        Arg::UInt(value as u64)
    }
}

impl From<isize> for Arg {
    fn from(value: isize) -> Self {
        Arg::Int(value as i64)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<char> for Arg {
    fn from(value: char) -> Self {
        Arg::Char(value)
    }
}

impl From<Handle> for Arg {
    fn from(value: Handle) -> Self {
        Arg::Handle(value)
    }
}

impl From<&'static Location<'static>> for Arg {
    fn from(value: &'static Location<'static>) -> Self {
        Arg::Location(value)
    }
}

impl From<std::io::Error> for Arg {
    fn from(value: std::io::Error) -> Self {
        Arg::error(value)
    }
}

impl From<crate::Error> for Arg {
    fn from(value: crate::Error) -> Self {
        Arg::error(value)
    }
}

impl From<anyhow::Error> for Arg {
    fn from(value: anyhow::Error) -> Self {
        let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = value.into();
        Arg::Error(Arc::from(boxed))
    }
}

impl From<&std::path::Path> for Arg {
    fn from(value: &std::path::Path) -> Self {
        Arg::Str(Cow::Owned(value.display().to_string()))
    }
}

impl From<&std::path::PathBuf> for Arg {
    fn from(value: &std::path::PathBuf) -> Self {
        Arg::from(value.as_path())
    }
}

/// Build a slice of [`Arg`]s from values convertible into them.
///
/// # Examples
///
/// ```
/// use logchan::Channel;
/// use logchan::args;
///
/// let channel = Channel::new("Default");
/// channel.info("Loaded {0} of {1} files", args![3, 10]);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        &[] as &[$crate::Arg]
    };
    ($($arg:expr),+ $(,)?) => {
        &[$($crate::Arg::from($arg)),+]
    };
}
