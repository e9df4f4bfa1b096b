use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use fastinf::SerializerOptions;
use fastinf::trace::{Token, read_trace};

fn fastinf_bin() -> &'static str {
    env!("CARGO_BIN_EXE_fastinf")
}

fn test_temp_dir(tag: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "fastinf-cli-e2e-{tag}-{}-{ts}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn run_fastinf(args: &[&str]) -> Output {
    Command::new(fastinf_bin())
        .args(args)
        .env_remove("FASTINF_DUMP")
        .output()
        .expect("run fastinf")
}

fn write_xml(path: &PathBuf, xml: &str) {
    fs::write(path, xml).expect("write xml");
}

fn assert_success(out: &Output, what: &str) {
    assert!(
        out.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

#[test]
fn cli_encode_matches_library() {
    let dir = test_temp_dir("encode");
    let xml = r#"<root xmlns="urn:r"><a x="1">t</a><a x="1">t</a></root>"#;
    let input = dir.join("in.xml");
    let fi = dir.join("out.finf");
    write_xml(&input, xml);

    let out = run_fastinf(&[
        "encode",
        "-i",
        input.to_str().unwrap(),
        "-o",
        fi.to_str().unwrap(),
    ]);
    assert_success(&out, "encode");

    let bytes = fs::read(&fi).expect("read fi");
    assert_eq!(
        bytes,
        fastinf::encode_xml_str(xml, &SerializerOptions::default()).unwrap()
    );
    assert!(!dir.join("out.finf.tmp").exists());
}

#[test]
fn cli_encode_derives_output_path() {
    let dir = test_temp_dir("derive");
    let input = dir.join("message.xml");
    write_xml(&input, "<m/>");

    let out = run_fastinf(&["encode", "-i", input.to_str().unwrap()]);
    assert_success(&out, "encode");
    assert!(dir.join("message.finf").exists());
}

#[test]
fn cli_dom_and_streaming_agree() {
    let dir = test_temp_dir("dom");
    let xml = "<r>\n  <!--c-->\n  <e k=\"v\"/>\n</r>";
    let input = dir.join("in.xml");
    let streamed = dir.join("s.finf");
    let dom = dir.join("d.finf");
    write_xml(&input, xml);

    for (path, extra) in [(&streamed, None), (&dom, Some("--dom"))] {
        let mut args = vec![
            "encode",
            "-i",
            input.to_str().unwrap(),
            "-o",
            path.to_str().unwrap(),
            "--ignore-whitespace",
            "--ignore-comments",
        ];
        args.extend(extra);
        assert_success(&run_fastinf(&args), "encode");
    }
    let streamed = fs::read(&streamed).unwrap();
    assert_eq!(streamed, fs::read(&dom).unwrap());
    let tokens = read_trace(&streamed).unwrap();
    assert!(!tokens.iter().any(|t| matches!(t, Token::Comment { .. } | Token::Characters { .. })));
}

#[test]
fn cli_trace_prints_tokens() {
    let dir = test_temp_dir("trace");
    let fi = dir.join("in.finf");
    fs::write(
        &fi,
        fastinf::encode_xml_str("<a><b/></a>", &SerializerOptions::default()).unwrap(),
    )
    .unwrap();

    let out = run_fastinf(&["trace", "-i", fi.to_str().unwrap()]);
    assert_success(&out, "trace");
    assert_eq!(String::from_utf8_lossy(&out.stdout), "SE a\n  SE b\n  EE\nEE\nED\n");
}

#[test]
fn cli_trace_rejects_garbage() {
    let dir = test_temp_dir("garbage");
    let fi = dir.join("bad.finf");
    fs::write(&fi, b"not fast infoset").unwrap();

    let out = run_fastinf(&["trace", "-i", fi.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("Fehler:"));
}

#[test]
fn cli_dump_formats() {
    let dir = test_temp_dir("dump");
    let input = dir.join("msg.xml");
    write_xml(&input, r#"<ping n="1"/>"#);

    let xml = run_fastinf(&["dump", "-i", input.to_str().unwrap()]);
    assert_success(&xml, "dump xml");
    assert_eq!(String::from_utf8_lossy(&xml.stdout), "<ping n=\"1\"/>\n");

    let b64 = run_fastinf(&["dump", "-i", input.to_str().unwrap(), "--format", "base64"]);
    assert_success(&b64, "dump base64");
    assert!(String::from_utf8_lossy(&b64.stdout).starts_with("4AAAAQ"));

    let out_path = dir.join("trace.txt");
    let trace = run_fastinf(&[
        "dump",
        "-i",
        input.to_str().unwrap(),
        "--format",
        "trace",
        "-o",
        out_path.to_str().unwrap(),
    ]);
    assert_success(&trace, "dump trace");
    assert_eq!(
        fs::read_to_string(&out_path).unwrap(),
        "SE ping n=\"1\"+\nEE\nED\n\n"
    );
}

#[test]
fn cli_missing_input_fails_without_output() {
    let dir = test_temp_dir("missing");
    let fi = dir.join("out.finf");
    let out = run_fastinf(&[
        "encode",
        "-i",
        dir.join("absent.xml").to_str().unwrap(),
        "-o",
        fi.to_str().unwrap(),
    ]);
    assert!(!out.status.success());
    assert!(!fi.exists());
    assert!(!dir.join("out.finf.tmp").exists());
}

#[test]
fn cli_encode_refuses_to_overwrite_input() {
    let dir = test_temp_dir("overwrite");
    let input = dir.join("message.finf");
    write_xml(&input, "<m/>");

    let out = run_fastinf(&["encode", "-i", input.to_str().unwrap()]);
    assert!(!out.status.success());
    assert_eq!(fs::read_to_string(&input).unwrap(), "<m/>");

    let soap = dir.join("message.soap");
    write_xml(&soap, "<m/>");
    assert_success(&run_fastinf(&["encode", "-i", soap.to_str().unwrap()]), "encode");
    assert!(dir.join("message.soap.finf").exists());
}
