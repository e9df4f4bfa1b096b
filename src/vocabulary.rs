//! Serializer vocabulary tables (X.891 7.13, 8.4).
//!
//! Alle Tabellen vergeben 1-basierte Indizes in der Reihenfolge des ersten
//! Auftretens. Index 0 bedeutet "nicht registriert" und erscheint nie auf
//! dem Wire. Die Tabellen leben genau eine Encoding-Session lang und werden
//! beim Reset geleert (Kapazität bleibt erhalten).
//!
//! Jede Tabelle fasst höchstens [`MAXIMUM_INDEX`] Einträge (X.891 C.25);
//! ist sie voll, wird nichts mehr hinzugefügt und neue Strings bzw. Namen
//! gehen nur noch literal auf den Wire.
//!
//! Zwei Arten von Tabellen:
//! - [`StringIndexMap`]: String → Index (Prefixe, Namespace-Namen,
//!   Local-Names, Attributwerte, Character Chunks, ...).
//! - [`QualifiedNameMap`]: lexikalischer Name → Liste von
//!   (Namespace-Name, Index). Derselbe Name in verschiedenen Namespaces
//!   bekommt je einen eigenen Index.

use std::rc::Rc;

use crate::constants::{MAXIMUM_INDEX, XML_NAMESPACE_NAME, XML_NAMESPACE_PREFIX};
use crate::qname::{QualifiedName, same_str};
use crate::{FastHashMap, FastIndexSet};

/// String → 1-based index table with a running character count.
pub struct StringIndexMap {
    strings: FastIndexSet<Rc<str>>,
    /// Summe der Zeichen aller Einträge (für Memory-Limits).
    total_characters: usize,
    max_index: usize,
}

impl Default for StringIndexMap {
    fn default() -> Self {
        Self::with_max_index(MAXIMUM_INDEX)
    }
}

impl StringIndexMap {
    /// Erstellt eine leere Tabelle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tabelle mit kleinerer Obergrenze (Tests).
    pub(crate) fn with_max_index(max_index: usize) -> Self {
        Self {
            strings: FastIndexSet::default(),
            total_characters: 0,
            max_index,
        }
    }

    /// Ob kein weiterer Eintrag mehr einen gültigen Index bekäme.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.strings.len() >= self.max_index
    }

    /// Index of `s`, if present.
    #[inline]
    pub fn get(&self, s: &str) -> Option<usize> {
        self.strings.get_index_of(s).map(|pos| pos + 1)
    }

    /// Returns the index of `s` if it is already present; otherwise adds it
    /// (unless the table is full) and returns `None` (the caller then writes
    /// the literal).
    pub fn obtain_index(&mut self, s: &str) -> Option<usize> {
        if let Some(index) = self.get(s) {
            return Some(index);
        }
        self.add(s);
        None
    }

    /// Fügt `s` hinzu (idempotent) und gibt den Index zurück; `None` wenn
    /// die Tabelle voll ist.
    pub fn add(&mut self, s: &str) -> Option<usize> {
        if let Some(index) = self.get(s) {
            return Some(index);
        }
        if self.is_full() {
            return None;
        }
        self.total_characters += s.chars().count();
        let (pos, _) = self.strings.insert_full(Rc::from(s));
        Some(pos + 1)
    }

    /// String zu einem Index (für Tests und Trace-Ausgaben).
    pub fn resolve(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|pos| self.strings.get_index(pos))
            .map(|s| &**s)
    }

    /// Nächster zu vergebender Index.
    pub fn next_index(&self) -> usize {
        self.strings.len() + 1
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Summe der Zeichen aller Einträge.
    pub fn total_characters(&self) -> usize {
        self.total_characters
    }

    pub fn clear(&mut self) {
        self.strings.clear();
        self.total_characters = 0;
    }
}

/// All qualified names registered under one lexical name.
#[derive(Default, Debug)]
pub struct QualifiedNameEntry {
    names: Vec<QualifiedName>,
}

impl QualifiedNameEntry {
    /// Sucht den Eintrag mit passendem Namespace-Namen (Pointer-Vergleich
    /// zuerst, da URIs interned sind).
    pub fn find(&self, namespace_name: &Rc<str>) -> Option<&QualifiedName> {
        self.names
            .iter()
            .find(|q| same_str(&q.namespace_name, namespace_name))
    }

    /// Hängt einen registrierten Namen an.
    pub fn push(&mut self, name: QualifiedName) {
        debug_assert!(name.is_registered(), "only registered names belong in an entry");
        self.names.push(name);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QualifiedName> {
        self.names.iter()
    }
}

/// Lexical name → qualified names, with a session-wide index counter.
pub struct QualifiedNameMap {
    entries: FastHashMap<Rc<str>, QualifiedNameEntry>,
    next_index: usize,
    max_index: usize,
}

impl QualifiedNameMap {
    pub fn new() -> Self {
        Self::with_max_index(MAXIMUM_INDEX)
    }

    pub(crate) fn with_max_index(max_index: usize) -> Self {
        Self {
            entries: FastHashMap::default(),
            next_index: 1,
            max_index,
        }
    }

    /// Ob alle Indizes vergeben sind.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.next_index > self.max_index
    }

    /// Returns the entry for `name`, creating an empty one on first use.
    pub fn obtain_entry(&mut self, name: &str) -> &mut QualifiedNameEntry {
        self.entries.entry_ref(name).or_default()
    }

    /// Next index to be assigned (starts at 1).
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Index of `(lexical, namespace_name)` if registered. Legt wie
    /// [`obtain_entry`](Self::obtain_entry) einen leeren Eintrag an.
    pub fn obtain(&mut self, lexical: &str, namespace_name: &Rc<str>) -> Option<usize> {
        self.obtain_entry(lexical)
            .find(namespace_name)
            .map(|found| found.index)
    }

    /// Registers `name` under `lexical` with the next index and returns it.
    /// Eine volle Tabelle bleibt unverändert (`None`).
    pub fn register(&mut self, lexical: &str, name: QualifiedName) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;
        self.entries
            .entry_ref(lexical)
            .or_default()
            .push(name.with_index(index));
        Some(index)
    }

    /// Anzahl der registrierten Namen (über alle Einträge).
    pub fn len(&self) -> usize {
        self.next_index - 1
    }

    pub fn is_empty(&self) -> bool {
        self.next_index == 1
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_index = 1;
    }
}

impl Default for QualifiedNameMap {
    fn default() -> Self {
        Self::new()
    }
}

/// The complete set of tables of one encoding session (X.891 8.4).
#[derive(Default)]
pub struct SerializerVocabulary {
    pub prefix: StringIndexMap,
    pub namespace_name: StringIndexMap,
    pub local_name: StringIndexMap,
    pub other_ncname: StringIndexMap,
    pub other_uri: StringIndexMap,
    pub attribute_value: StringIndexMap,
    pub other_string: StringIndexMap,
    pub character_content_chunk: StringIndexMap,
    pub element_name: QualifiedNameMap,
    pub attribute_name: QualifiedNameMap,
}

impl SerializerVocabulary {
    /// Erstellt ein Vocabulary mit den vordefinierten Einträgen:
    /// Prefix 1 = `xml`, Namespace-Name 1 = XML-Namespace (X.891 7.2.21, 7.2.22).
    pub fn new() -> Self {
        let mut v = Self::default();
        v.add_builtins();
        v
    }

    fn add_builtins(&mut self) {
        self.prefix.add(XML_NAMESPACE_PREFIX);
        self.namespace_name.add(XML_NAMESPACE_NAME);
    }

    /// Leert alle Tabellen und stellt die vordefinierten Einträge wieder her.
    pub fn clear(&mut self) {
        self.prefix.clear();
        self.namespace_name.clear();
        self.local_name.clear();
        self.other_ncname.clear();
        self.other_uri.clear();
        self.attribute_value.clear();
        self.other_string.clear();
        self.character_content_chunk.clear();
        self.element_name.clear();
        self.attribute_name.clear();
        self.add_builtins();
    }
}
