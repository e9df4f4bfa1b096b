//! Message-dump pipeline stage.
//!
//! Ein [`DumpTube`] sitzt in einer Kette von [`Tube`]s, rendert jede
//! Nachricht auf dem Hin- und Rückweg über einen [`MessageDumper`] und gibt
//! sie unverändert weiter. Fehler beim Rendern werden mit `warn!` gemeldet
//! und nie an die Kette weitergereicht.
//!
//! # Beispiel
//!
//! ```
//! use fastinf::dom::Document;
//! use fastinf::dump::{DumpFeature, DumpFormat, DumpTube, Packet, Tube};
//! use fastinf::Result;
//!
//! struct Echo;
//!
//! impl Tube for Echo {
//!     fn process_request(&mut self, packet: Packet) -> Result<Packet> {
//!         Ok(packet)
//!     }
//!     fn process_response(&mut self, packet: Packet) -> Result<Packet> {
//!         Ok(packet)
//!     }
//! }
//!
//! let feature = DumpFeature::new()
//!     .with_enabled(true)
//!     .with_store_messages(true)
//!     .with_format(DumpFormat::Xml);
//! let mut tube = DumpTube::new("client", feature, Echo);
//! let packet = Packet::new(Document::parse_str("<ping/>").unwrap());
//! let packet = tube.process_request(packet).unwrap();
//! assert!(packet.message.is_some());
//! assert_eq!(tube.messages(), ["<ping/>"]);
//! ```

use base64::Engine as _;
use log::{Level, log, log_enabled, trace, warn};

use crate::dom::Document;
use crate::node::DocumentNode;
use crate::options::SerializerOptions;
use crate::serializer::DocumentSerializer;
use crate::trace::read_trace;
use crate::xml_serializer::node_to_xml;
use crate::{Error, Result};

/// Umgebungsvariable, die das Dumping ein- (`1`, `true`) oder ausschaltet
/// (`0`, `false`).
pub const DUMP_ENV_VAR: &str = "FASTINF_DUMP";

/// Default-Log-Target der gedumpten Nachrichten.
pub const DEFAULT_DUMP_TARGET: &str = "fastinf::dump";

/// Darstellung einer gedumpten Nachricht.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    /// XML-Text.
    #[default]
    Xml,
    /// Fast-Infoset-Bytes, Base64-kodiert.
    Base64,
    /// Eine Zeile pro Fast-Infoset-Item (siehe [`trace`](crate::trace)).
    Trace,
}

/// Configuration of the dump stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFeature {
    pub enabled: bool,
    /// Log-Target der Nachrichten.
    pub target: String,
    pub level: Level,
    pub format: DumpFormat,
    /// Gerenderte Nachrichten zusätzlich im [`DumpTube`] aufbewahren.
    pub store_messages: bool,
    /// Optionen für die Formate `Base64` und `Trace`.
    pub options: SerializerOptions,
}

impl Default for DumpFeature {
    fn default() -> Self {
        Self {
            enabled: false,
            target: DEFAULT_DUMP_TARGET.to_owned(),
            level: Level::Info,
            format: DumpFormat::Xml,
            store_messages: false,
            options: SerializerOptions::default(),
        }
    }
}

impl DumpFeature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, val: bool) -> Self { self.enabled = val; self }
    pub fn with_target(mut self, target: impl Into<String>) -> Self { self.target = target.into(); self }
    pub fn with_level(mut self, level: Level) -> Self { self.level = level; self }
    pub fn with_format(mut self, format: DumpFormat) -> Self { self.format = format; self }
    pub fn with_store_messages(mut self, val: bool) -> Self { self.store_messages = val; self }
    pub fn with_options(mut self, options: SerializerOptions) -> Self { self.options = options; self }

    /// Wendet [`DUMP_ENV_VAR`] an; unbekannte Werte ändern nichts.
    pub fn from_env(self) -> Self {
        let value = std::env::var(DUMP_ENV_VAR).ok();
        self.with_env_value(value.as_deref())
    }

    fn with_env_value(mut self, value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1") | Some("true") => self.enabled = true,
            Some("0") | Some("false") => self.enabled = false,
            _ => {}
        }
        self
    }
}

// ============================================================================
// MessageDumper
// ============================================================================

/// Renders messages for the dump stage.
#[derive(Debug, Clone)]
pub struct MessageDumper {
    feature: DumpFeature,
}

impl MessageDumper {
    pub fn new(feature: DumpFeature) -> Self {
        Self { feature }
    }

    pub fn feature(&self) -> &DumpFeature {
        &self.feature
    }

    /// Cheap check whether rendering would reach a logger at all.
    pub fn is_logging_enabled(&self) -> bool {
        self.feature.enabled && log_enabled!(target: self.feature.target.as_str(), self.feature.level)
    }

    /// Renders `document` in the configured format.
    ///
    /// Jeder Fehler wird als [`Error::RenderFailed`] gemeldet.
    pub fn render_message<'a, N: DocumentNode<'a>>(&self, document: N) -> Result<String> {
        self.render(document)
            .map_err(|e| Error::RenderFailed(e.to_string()))
    }

    fn render<'a, N: DocumentNode<'a>>(&self, document: N) -> Result<String> {
        match self.feature.format {
            DumpFormat::Xml => node_to_xml(document),
            DumpFormat::Base64 => {
                let bytes = self.encode(document)?;
                Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            DumpFormat::Trace => {
                let bytes = self.encode(document)?;
                Ok(crate::trace::render(&read_trace(&bytes)?))
            }
        }
    }

    fn encode<'a, N: DocumentNode<'a>>(&self, document: N) -> Result<Vec<u8>> {
        DocumentSerializer::new(self.feature.options.clone()).serialize_to_vec(document)
    }
}

// ============================================================================
// Tubes
// ============================================================================

/// Nachricht auf dem Weg durch die Pipeline.
#[derive(Debug, Clone, Default)]
pub struct Packet {
    /// `None` für One-Way-Antworten ohne Nachricht.
    pub message: Option<Document>,
}

impl Packet {
    pub fn new(message: Document) -> Self {
        Self {
            message: Some(message),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// One stage of a request/response pipeline.
pub trait Tube {
    fn process_request(&mut self, packet: Packet) -> Result<Packet>;

    fn process_response(&mut self, packet: Packet) -> Result<Packet>;
}

/// Pipeline stage that dumps every message and forwards it unchanged.
pub struct DumpTube<T: Tube> {
    name: String,
    dumper: MessageDumper,
    next: T,
    messages: Vec<String>,
}

impl<T: Tube> DumpTube<T> {
    /// `name` erscheint in jeder Log-Zeile (z.B. `client`, `server`).
    pub fn new(name: impl Into<String>, feature: DumpFeature, next: T) -> Self {
        Self {
            name: name.into(),
            dumper: MessageDumper::new(feature),
            next,
            messages: Vec::new(),
        }
    }

    pub fn dumper(&self) -> &MessageDumper {
        &self.dumper
    }

    pub fn next(&self) -> &T {
        &self.next
    }

    /// Gespeicherte Nachrichten (nur mit `store_messages`).
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    fn dump(&mut self, direction: &str, packet: &Packet) {
        let feature = self.dumper.feature();
        let store = feature.enabled && feature.store_messages;
        if !store && !self.dumper.is_logging_enabled() {
            return;
        }
        let Some(message) = &packet.message else {
            trace!("{} {direction}: no message", self.name);
            return;
        };
        match self.dumper.render_message(message.root()) {
            Ok(text) => {
                log!(
                    target: feature.target.as_str(),
                    feature.level,
                    "{} {direction}:\n{text}",
                    self.name
                );
                if store {
                    self.messages.push(text);
                }
            }
            Err(e) => warn!("{} {direction}: message not dumped: {e}", self.name),
        }
    }
}

impl<T: Tube> Tube for DumpTube<T> {
    fn process_request(&mut self, packet: Packet) -> Result<Packet> {
        self.dump("request", &packet);
        self.next.process_request(packet)
    }

    fn process_response(&mut self, packet: Packet) -> Result<Packet> {
        let packet = self.next.process_response(packet)?;
        self.dump("response", &packet);
        Ok(packet)
    }
}
