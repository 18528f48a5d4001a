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


use std::fmt;
use std::fmt::Write;

use crate::format::Arg;

type Predicate = Box<dyn Fn(&Arg) -> bool + Send + Sync>;
type Renderer = Box<dyn Fn(&Arg) -> String + Send + Sync>;

/// An ordered list of renderers for arguments whose plain [`Display`](fmt::Display) output is
/// not good enough for a log line.
///
/// Renderers are evaluated in registration order; the first matching predicate wins.
///
/// # Examples
///
/// ```
/// use logchan::Arg;
/// use logchan::format::RendererRegistry;
///
/// let mut registry = RendererRegistry::default();
/// registry.register(
///     |arg| matches!(arg, Arg::Bool(_)),
///     |arg| if matches!(arg, Arg::Bool(true)) { "yes".into() } else { "no".into() },
/// );
/// assert_eq!(registry.render(&Arg::Bool(true)).as_deref(), Some("yes"));
/// ```
pub struct RendererRegistry {
    renderers: Vec<(Predicate, Renderer)>,
}

impl RendererRegistry {
    /// Create a registry without any renderer.
    pub fn empty() -> Self {
        Self { renderers: vec![] }
    }

    /// Append a renderer for every argument matching the predicate.
    pub fn register<P, R>(&mut self, predicate: P, renderer: R) -> &mut Self
    where
        P: Fn(&Arg) -> bool + Send + Sync + 'static,
        R: Fn(&Arg) -> String + Send + Sync + 'static,
    {
        self.renderers
            .push((Box::new(predicate), Box::new(renderer)));
        self
    }

    /// Render the argument with the first matching renderer, if any.
    pub fn render(&self, arg: &Arg) -> Option<String> {
        self.renderers
            .iter()
            .find(|(predicate, _)| predicate(arg))
            .map(|(_, renderer)| renderer(arg))
    }

    /// The number of registered renderers.
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    /// Whether no renderer is registered.
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl Default for RendererRegistry {
    /// Renderers for errors, handles and source locations.
    fn default() -> Self {
        let mut registry = RendererRegistry::empty();
        registry
            .register(|arg| matches!(arg, Arg::Error(_)), render_error)
            .register(|arg| matches!(arg, Arg::Handle(_)), render_handle)
            .register(|arg| matches!(arg, Arg::Location(_)), render_location);
        registry
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("renderers", &self.renderers.len())
            .finish()
    }
}

fn render_error(arg: &Arg) -> String {
    let Arg::Error(err) = arg else {
        return arg.to_string();
    };

    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        // SAFETY: write to a string always succeeds
        write!(&mut text, "\n  caused by: {err}").unwrap();
        source = err.source();
    }
    text
}

fn render_handle(arg: &Arg) -> String {
    match arg.as_handle() {
        Some(handle) => format!("{} \"{}\" ({})", handle.kind(), handle.name(), handle.id()),
        None => arg.to_string(),
    }
}

fn render_location(arg: &Arg) -> String {
    match arg {
        Arg::Location(location) => format!(
            "at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ),
        _ => arg.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::format::Handle;

    #[test]
    fn test_error_renders_source_chain() {
        let err = crate::Error::new("failed to open log").with_source(io::Error::other("disk full"));
        let text = RendererRegistry::default()
            .render(&Arg::from(err))
            .unwrap();
        assert!(text.starts_with("failed to open log"));
        assert!(text.ends_with("\n  caused by: disk full"));
    }

    #[test]
    fn test_handle_and_location() {
        let registry = RendererRegistry::default();
        let handle = Arg::from(Handle::new("GameObject", "Player", 7));
        assert_eq!(
            registry.render(&handle).as_deref(),
            Some("GameObject \"Player\" (7)")
        );

        let location = registry.render(&Arg::caller()).unwrap();
        assert!(location.starts_with("at "));
        assert!(location.contains("render.rs"));
    }

    #[test]
    fn test_registration_order() {
        let mut registry = RendererRegistry::empty();
        registry
            .register(|arg| matches!(arg, Arg::Int(_)), |_| "first".to_string())
            .register(|arg| matches!(arg, Arg::Int(_)), |_| "second".to_string());
        assert_eq!(registry.render(&Arg::Int(1)).as_deref(), Some("first"));
        assert_eq!(registry.render(&Arg::Bool(true)), None);
        assert_eq!(registry.len(), 2);
    }
}
