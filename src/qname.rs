//! Qualified names and the URI interner (X.891 7.17, C.17, C.18).
//!
//! Ein Fast-Infoset-Name besteht aus Prefix, Namespace-Name und Local-Name.
//! Zwei Namen sind für das Vocabulary gleich, wenn Namespace-Name und
//! Local-Name übereinstimmen; der Prefix ist nur für literale Namen relevant.
//!
//! ## Interning
//!
//! Namespace-URIs wiederholen sich in praktisch jedem Element. Der
//! [`StringInterner`] liefert für gleiche Strings denselben `Rc<str>`, so dass
//! Vergleiche im Vocabulary meist schon an `Rc::ptr_eq` entschieden werden.

use std::fmt;
use std::rc::Rc;

use crate::FastHashSet;

/// A qualified name registered in a vocabulary table.
#[derive(Clone)]
pub struct QualifiedName {
    /// Prefix, leer für unpräfixierte Namen.
    pub prefix: Rc<str>,
    /// Namespace name, empty string means no namespace.
    pub namespace_name: Rc<str>,
    pub local_name: Rc<str>,
    /// 1-basierter Index im Vocabulary (0 = noch nicht registriert).
    pub index: usize,
}

impl QualifiedName {
    /// Erstellt einen noch nicht registrierten Namen (Index 0).
    pub fn new(
        prefix: impl Into<Rc<str>>,
        namespace_name: impl Into<Rc<str>>,
        local_name: impl Into<Rc<str>>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            namespace_name: namespace_name.into(),
            local_name: local_name.into(),
            index: 0,
        }
    }

    /// Gibt eine Kopie mit gesetztem Index zurück.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Ob der Name bereits einen Vocabulary-Index hat.
    pub fn is_registered(&self) -> bool {
        self.index != 0
    }

    /// Lexikalische Form `prefix:local` bzw. `local`.
    pub fn lexical(&self) -> String {
        if self.prefix.is_empty() {
            self.local_name.to_string()
        } else {
            format!("{}:{}", self.prefix, self.local_name)
        }
    }
}

/// Gleichheit über Namespace-Name und Local-Name; Prefix und Index zählen nicht.
impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        same_str(&self.namespace_name, &other.namespace_name)
            && same_str(&self.local_name, &other.local_name)
    }
}

impl Eq for QualifiedName {}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace_name, self.lexical())?;
        if self.index != 0 {
            write!(f, "#{}", self.index)?;
        }
        Ok(())
    }
}

/// Vergleicht zwei interned Strings: erst per Pointer, dann per Inhalt.
#[inline]
pub fn same_str(a: &Rc<str>, b: &Rc<str>) -> bool {
    Rc::ptr_eq(a, b) || **a == **b
}

/// Splits a lexical name into `(prefix, local_name)`; the prefix is empty for
/// unprefixed names.
pub fn split_lexical(name: &str) -> (&str, &str) {
    match memchr::memchr(b':', name.as_bytes()) {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("", name),
    }
}

/// Deduplicates strings into shared `Rc<str>` handles.
///
/// Lebensdauer: ein Interner pro Serializer, wird mit `clear()` beim Reset
/// geleert.
#[derive(Default)]
pub struct StringInterner {
    strings: FastHashSet<Rc<str>>,
}

impl StringInterner {
    /// Erstellt einen neuen, leeren Interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Internt einen String. Bereits bekannte Strings werden ohne Allokation
    /// zurückgegeben.
    pub fn intern(&mut self, s: &str) -> Rc<str> {
        if let Some(existing) = self.strings.get(s) {
            return Rc::clone(existing);
        }
        let rc: Rc<str> = Rc::from(s);
        self.strings.insert(Rc::clone(&rc));
        rc
    }

    /// Anzahl der internierten Strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Leert den Interner, behält aber die Kapazität.
    pub fn clear(&mut self) {
        self.strings.clear();
    }
}
