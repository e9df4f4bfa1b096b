//! fastinf – streaming Fast Infoset (ITU-T X.891) encoder
//!
//! # Beispiel
//!
//! ```
//! use fastinf::{DocumentSerializer, SerializerOptions};
//! use fastinf::dom::Document;
//! use fastinf::trace::{self, Token};
//!
//! let doc = Document::parse_str("<greeting xmlns='urn:g'>Hello</greeting>").unwrap();
//! let mut serializer = DocumentSerializer::new(SerializerOptions::default());
//! let bytes = serializer.serialize_to_vec(doc.root()).unwrap();
//!
//! let tokens = trace::read_trace(&bytes).unwrap();
//! assert!(matches!(tokens[0], Token::StartElement { .. }));
//! assert_eq!(tokens.last(), Some(&Token::EndDocument));
//! ```

pub mod constants;
pub mod dom;
pub mod dump;
pub mod encoder;
pub mod error;
pub mod header;
pub mod integer;
pub mod namespace;
pub mod node;
pub mod octet_stream;
pub mod options;
pub mod qname;
pub mod serializer;
pub mod streaming;
pub mod string;
pub mod trace;
pub mod vocabulary;
pub mod walker;
mod xml;
pub mod xml_serializer;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent, für interne Datenstrukturen).
/// Nutzt hashbrown direkt für entry_ref().
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// HashSet mit ahash.
pub(crate) type FastHashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;

/// IndexSet mit ahash (Einfügereihenfolge = Vocabulary-Index).
pub(crate) type FastIndexSet<K> = indexmap::IndexSet<K, ahash::RandomState>;

// Public API: Options
pub use options::{CharacterEncodingScheme, SerializerOptions};

// Public API: Encoder
pub use encoder::{AttributeRef, Encoder, NameRef, NamespaceRef};
pub use header::FiHeader;
pub use namespace::NamespaceContext;
pub use vocabulary::SerializerVocabulary;

// Public API: Document model + Serializer
pub use node::{DocumentNode, NodeKind};
pub use serializer::DocumentSerializer;
pub use walker::{NodeVisitor, walk};

// Public API: Streaming
pub use streaming::{encode_xml_file, encode_xml_stream, encode_xml_str};

// Public API: Trace + XML
pub use trace::{Token, read_trace};
pub use xml_serializer::{node_to_xml, node_to_xml_writer};

// Public API: Dump
pub use dump::{DumpFeature, DumpFormat, DumpTube, MessageDumper, Packet, Tube};
