//! Namespace context stack (Namespaces in XML 1.0, section 6).
//!
//! Bindings liegen flach in einem Vec; `contexts` merkt sich für jeden
//! offenen Scope die Länge von `bindings` beim `push_context()`. Sichtbar ist
//! für jeden Prefix immer das zuletzt angehängte Binding, das noch nicht per
//! `pop_context()` abgeschnitten wurde.
//!
//! Die beiden Builtins (`xml`, `xmlns`) stehen fest an Position 0 und 1 und
//! überleben `pop_context()` und `reset_contexts()`.

use std::rc::Rc;

use crate::FastHashSet;
use crate::constants::{
    XML_NAMESPACE_NAME, XML_NAMESPACE_PREFIX, XMLNS_NAMESPACE_NAME, XMLNS_NAMESPACE_PREFIX,
};

const BUILTIN_BINDINGS: usize = 2;

/// A single prefix binding. `uri == None` is an explicit undeclaration.
#[derive(Debug, Clone)]
struct Binding {
    prefix: Rc<str>,
    uri: Option<Rc<str>>,
}

/// Scoped prefix ↔ namespace URI resolution.
///
/// Eine Instanz gehört genau einer Serialisierungs-Session.
#[derive(Debug, Clone)]
pub struct NamespaceContext {
    bindings: Vec<Binding>,
    contexts: Vec<usize>,
}

impl NamespaceContext {
    /// Erstellt einen Stack, der nur die beiden Builtins enthält.
    pub fn new() -> Self {
        let mut bindings = Vec::with_capacity(8);
        bindings.push(Binding {
            prefix: Rc::from(XML_NAMESPACE_PREFIX),
            uri: Some(Rc::from(XML_NAMESPACE_NAME)),
        });
        bindings.push(Binding {
            prefix: Rc::from(XMLNS_NAMESPACE_PREFIX),
            uri: Some(Rc::from(XMLNS_NAMESPACE_NAME)),
        });
        Self {
            bindings,
            contexts: Vec::with_capacity(8),
        }
    }

    /// Returns the URI bound to `prefix` in the innermost scope, or `""` if the
    /// prefix is unknown or explicitly undeclared.
    pub fn namespace_uri(&self, prefix: &str) -> &str {
        self.bindings
            .iter()
            .rev()
            .find(|b| &*b.prefix == prefix)
            .and_then(|b| b.uri.as_deref())
            .unwrap_or("")
    }

    /// Returns the innermost prefix bound to `uri` that is not shadowed by a
    /// later binding of the same prefix.
    pub fn prefix<'a>(&'a self, uri: &'a str) -> Option<&'a str> {
        self.prefixes(uri).next()
    }

    /// All non-shadowed prefixes bound to `uri`, innermost first.
    ///
    /// Lazy: ein Rückwärtslauf über die Bindings; jeder Prefix zählt nur beim
    /// ersten (innersten) Treffer, spätere Treffer sind verschattet.
    pub fn prefixes<'a>(&'a self, uri: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let mut seen: FastHashSet<&'a str> = FastHashSet::default();
        self.bindings.iter().rev().filter_map(move |b| {
            let prefix: &'a str = &b.prefix;
            if !seen.insert(prefix) {
                return None;
            }
            (b.uri.as_deref() == Some(uri)).then_some(prefix)
        })
    }

    /// Declares `prefix` (empty for the default namespace) in the current scope.
    ///
    /// `xml` und `xmlns` werden stillschweigend ignoriert. `uri == None`
    /// hebt die Bindung des Prefix für diesen Scope auf. Ein zweites Binding
    /// desselben Prefix im selben Scope ersetzt das erste.
    pub fn declare_namespace(&mut self, prefix: &str, uri: Option<&str>) {
        if prefix == XML_NAMESPACE_PREFIX || prefix == XMLNS_NAMESPACE_PREFIX {
            return;
        }
        let scope_start = self.scope_start();
        let uri = uri.map(Rc::from);
        if let Some(existing) = self.bindings[scope_start..]
            .iter_mut()
            .find(|b| &*b.prefix == prefix)
        {
            existing.uri = uri;
            return;
        }
        grow(&mut self.bindings);
        self.bindings.push(Binding {
            prefix: Rc::from(prefix),
            uri,
        });
    }

    /// Declares the default namespace (`xmlns="..."`) in the current scope.
    pub fn declare_default_namespace(&mut self, uri: Option<&str>) {
        self.declare_namespace("", uri);
    }

    /// Opens a new scope.
    pub fn push_context(&mut self) {
        grow(&mut self.contexts);
        self.contexts.push(self.bindings.len());
    }

    /// Closes the innermost scope; no-op when no scope is open.
    pub fn pop_context(&mut self) {
        if let Some(start) = self.contexts.pop() {
            self.bindings.truncate(start);
        }
    }

    /// Drops all scopes and declared bindings, keeping only the builtins.
    pub fn reset_contexts(&mut self) {
        self.bindings.truncate(BUILTIN_BINDINGS);
        self.contexts.clear();
    }

    /// Anzahl der offenen Scopes.
    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    /// Ob im aktuellen Scope Bindings deklariert wurden.
    pub fn current_scope_is_empty(&self) -> bool {
        self.bindings.len() == self.scope_start()
    }

    /// Bindings des aktuellen Scopes als `(prefix, uri)`, `uri == ""` für
    /// Undeclarations.
    pub fn current_scope(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings[self.scope_start()..]
            .iter()
            .map(|b| (&*b.prefix, b.uri.as_deref().unwrap_or("")))
    }

    fn scope_start(&self) -> usize {
        self.contexts.last().copied().unwrap_or(BUILTIN_BINDINGS)
    }
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Wachstum um Faktor 1.5 (+1) statt der Verdopplung von `Vec::push`.
#[inline]
fn grow<T>(v: &mut Vec<T>) {
    if v.len() == v.capacity() {
        v.reserve_exact(v.capacity() / 2 + 1);
    }
}
