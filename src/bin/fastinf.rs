//! fastinf CLI: XML -> Fast Infoset, Trace und Message-Dump.

#[cfg(feature = "fast-alloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fastinf::dom::Document;
use fastinf::dump::{DumpFeature, DumpFormat, DumpTube, MessageDumper, Packet, Tube};
use fastinf::{CharacterEncodingScheme, DocumentSerializer, SerializerOptions};
use log::{debug, log, warn};
use std::io::{BufWriter, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "fastinf", about = "XML -> Fast Infoset (ITU-T X.891) encoding")]
struct Cli {
    /// Verbose logging (info statt warn; RUST_LOG hat Vorrang)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode XML to Fast Infoset
    Encode(EncodeArgs),
    /// Print the item structure of a Fast Infoset document
    Trace(TraceArgs),
    /// Run an XML message through the dump pipeline stage
    Dump(DumpArgs),
}

#[derive(Args)]
struct EncodeArgs {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    options: OptionArgs,

    /// Build a document tree first instead of streaming the XML events
    #[arg(long)]
    dom: bool,
}

#[derive(Args)]
struct TraceArgs {
    /// Input file (- for stdin)
    #[arg(short, long)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, default_value = "-")]
    output: String,
}

#[derive(Args)]
struct DumpArgs {
    /// Input file (- for stdin)
    #[arg(short, long)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Rendering of the dumped message
    #[arg(long, value_enum, default_value_t = FormatArg::Xml)]
    format: FormatArg,

    #[command(flatten)]
    options: OptionArgs,
}

#[derive(Args)]
struct IoArgs {
    /// Input file (- for stdin)
    #[arg(short, long)]
    input: String,

    /// Output file (default: input with .xml replaced by .finf; -o - = stdout)
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Args)]
struct OptionArgs {
    /// Drop whitespace-only text content
    #[arg(long)]
    ignore_whitespace: bool,

    /// Drop comments
    #[arg(long)]
    ignore_comments: bool,

    /// Drop processing instructions
    #[arg(long)]
    ignore_pis: bool,

    /// Attribute values shorter than this are added to the value table
    #[arg(long, value_name = "CHARS")]
    attribute_value_size: Option<usize>,

    /// Character chunks shorter than this are added to the chunk table
    #[arg(long, value_name = "CHARS")]
    chunk_size: Option<usize>,

    /// Upper bound for the attribute value table (total characters)
    #[arg(long, value_name = "CHARS")]
    attribute_value_memory_limit: Option<usize>,

    /// Upper bound for the character chunk table (total characters)
    #[arg(long, value_name = "CHARS")]
    chunk_memory_limit: Option<usize>,

    /// UTF-16 for attribute values and character content
    #[arg(long)]
    utf16: bool,

    /// Write `<?xml encoding='finf'?>` in front of the header
    #[arg(long)]
    xml_declaration: bool,
}

impl OptionArgs {
    fn to_options(&self) -> SerializerOptions {
        let mut opts = SerializerOptions::default()
            .with_ignore_whitespace_text_content(self.ignore_whitespace)
            .with_ignore_comments(self.ignore_comments)
            .with_ignore_processing_instructions(self.ignore_pis)
            .with_xml_declaration(self.xml_declaration);
        if let Some(size) = self.attribute_value_size {
            opts = opts.with_attribute_value_size_constraint(size);
        }
        if let Some(size) = self.chunk_size {
            opts = opts.with_character_content_chunk_size_constraint(size);
        }
        if let Some(limit) = self.attribute_value_memory_limit {
            opts = opts.with_attribute_value_map_memory_limit(limit);
        }
        if let Some(limit) = self.chunk_memory_limit {
            opts = opts.with_character_content_chunk_map_memory_limit(limit);
        }
        if self.utf16 {
            opts = opts.with_character_encoding_scheme(CharacterEncodingScheme::Utf16);
        }
        opts
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Xml,
    Base64,
    Trace,
}

impl From<FormatArg> for DumpFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xml => DumpFormat::Xml,
            FormatArg::Base64 => DumpFormat::Base64,
            FormatArg::Trace => DumpFormat::Trace,
        }
    }
}

/// Endpunkt der Dump-Pipeline: gibt die Nachricht unverändert zurück.
struct Loopback;

impl Tube for Loopback {
    fn process_request(&mut self, packet: Packet) -> fastinf::Result<Packet> {
        Ok(packet)
    }

    fn process_response(&mut self, packet: Packet) -> fastinf::Result<Packet> {
        Ok(packet)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Fehler: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Encode(args) => run_encode(args),
        Command::Trace(args) => run_trace(args),
        Command::Dump(args) => run_dump(args),
    }
}

fn read_input(path: &str) -> Result<Vec<u8>, String> {
    if path == "-" {
        if std::io::stdin().is_terminal() {
            eprintln!("Lese von stdin (Ctrl+D zum Beenden)...");
        }
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| format!("Lesefehler (stdin): {e}"))?;
        Ok(buf)
    } else {
        std::fs::read(path).map_err(|e| format!("Lesefehler '{}': {e}", path))
    }
}

fn read_xml_document(path: &str) -> Result<Document, String> {
    let data = read_input(path)?;
    Document::parse_reader(data.as_slice()).map_err(|e| format!("Parse-Fehler: {e}"))
}

fn run_encode(args: EncodeArgs) -> Result<(), String> {
    let opts = args.options.to_options();
    let output_path = finf_output_path(args.io.output.as_deref(), &args.io.input)?;

    if args.dom {
        let doc = read_xml_document(&args.io.input)?;
        let feature = DumpFeature::new().with_options(opts.clone()).from_env();
        let dumper = MessageDumper::new(feature);
        if dumper.is_logging_enabled() {
            let feature = dumper.feature();
            match dumper.render_message(doc.root()) {
                Ok(text) => log!(target: feature.target.as_str(), feature.level, "input:\n{text}"),
                Err(e) => warn!("input not dumped: {e}"),
            }
        }
        let mut serializer = DocumentSerializer::new(opts);
        return write_to_output(&output_path, |mut writer| {
            serializer
                .serialize(doc.root(), &mut writer)
                .map_err(|e| format!("Encode-Fehler: {e}"))
        });
    }

    write_to_output(&output_path, |writer| {
        let result = if args.io.input == "-" {
            fastinf::encode_xml_stream(std::io::stdin().lock(), writer, &opts)
        } else {
            let file = std::fs::File::open(&args.io.input)
                .map_err(|e| format!("Lesefehler '{}': {e}", args.io.input))?;
            fastinf::encode_xml_stream(std::io::BufReader::new(file), writer, &opts)
        };
        result.map_err(|e| format!("Encode-Fehler: {e}"))
    })
}

fn run_trace(args: TraceArgs) -> Result<(), String> {
    let data = read_input(&args.input)?;
    let tokens = fastinf::read_trace(&data).map_err(|e| format!("Trace-Fehler: {e}"))?;
    debug!("{} tokens", tokens.len());
    let text = fastinf::trace::render(&tokens);
    write_to_output(Path::new(&args.output), |mut writer| {
        writer
            .write_all(text.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| format!("Schreibfehler: {e}"))
    })
}

fn run_dump(args: DumpArgs) -> Result<(), String> {
    let doc = read_xml_document(&args.input)?;
    let feature = DumpFeature::new()
        .with_enabled(true)
        .with_store_messages(true)
        .with_format(args.format.into())
        .with_options(args.options.to_options());
    let mut tube = DumpTube::new("cli", feature, Loopback);
    let packet = tube
        .process_request(Packet::new(doc))
        .map_err(|e| format!("Pipeline-Fehler: {e}"))?;
    tube.process_response(packet)
        .map_err(|e| format!("Pipeline-Fehler: {e}"))?;

    let messages = tube.take_messages();
    let Some(request) = messages.first() else {
        return Err("Nachricht konnte nicht gerendert werden (siehe Log)".into());
    };
    write_to_output(Path::new(&args.output), |mut writer| {
        writer
            .write_all(request.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush())
            .map_err(|e| format!("Schreibfehler: {e}"))
    })
}

/// Endung, die `encode` ohne `-o` an den Eingabenamen vergibt.
const FINF_EXTENSION: &str = "finf";

/// Ausgabeziel: `-` ist stdout, alles andere eine Datei.
fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Schreibt nach stdout oder über eine `<ziel>.tmp`-Datei, die erst bei
/// Erfolg auf das Ziel umbenannt wird. Ein fehlgeschlagener Encode hinterlässt
/// weder Ziel noch Temp-Datei.
fn write_to_output(
    output: &Path,
    write_fn: impl FnOnce(BufWriter<Box<dyn Write>>) -> Result<(), String>,
) -> Result<(), String> {
    if is_stdout(output) {
        return write_fn(BufWriter::new(Box::new(std::io::stdout())));
    }

    let mut tmp = output.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let file = std::fs::File::create(&tmp)
        .map_err(|e| format!("Kann '{}' nicht anlegen: {e}", tmp.display()))?;
    if let Err(e) = write_fn(BufWriter::new(Box::new(file))) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    std::fs::rename(&tmp, output)
        .map_err(|e| format!("Kann '{}' nicht ersetzen: {e}", output.display()))
}

/// Zielpfad für `encode`.
///
/// Ohne `-o`: `msg.xml` wird zu `msg.finf`, jede andere Endung bekommt
/// `.finf` angehängt (`msg.soap` → `msg.soap.finf`). Eine Eingabe, die schon
/// `.finf` heißt, und ein `-o` gleich der Eingabe werden abgelehnt.
fn finf_output_path(explicit: Option<&str>, input: &str) -> Result<PathBuf, String> {
    let input_path = Path::new(input);
    if let Some(path) = explicit {
        let path = PathBuf::from(path);
        if !is_stdout(&path) && path == input_path {
            return Err(format!("Ausgabe '{input}' wäre gleich der Eingabe"));
        }
        return Ok(path);
    }
    if is_stdout(input_path) {
        return Err("Eingabe von stdin: Ausgabedatei mit -o angeben".into());
    }
    if input_path.file_name().is_none() {
        return Err(format!("'{input}' ist kein Dateipfad"));
    }
    match input_path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(FINF_EXTENSION) => Err(format!(
            "'{input}' ist bereits Fast Infoset; Ausgabe mit -o angeben"
        )),
        Some(ext) if ext.eq_ignore_ascii_case("xml") => {
            Ok(input_path.with_extension(FINF_EXTENSION))
        }
        _ => {
            let mut name = input_path.as_os_str().to_owned();
            name.push(".");
            name.push(FINF_EXTENSION);
            Ok(PathBuf::from(name))
        }
    }
}
