use cmdrelay_command::{CommandSpec, Options};
use cmdrelay_common::{OutputSink, Platform};
use cmdrelay_sink::{TempFile, TempFileOptions};
use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use serde_json::json;

fn spec_for(server: &Server) -> CommandSpec {
    let mut spec = CommandSpec::new();
    spec.set_platform(Platform::Unix).set_command(&server.url());
    spec
}

#[test]
fn successful_conversion_fills_temp_file() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/pdf-from-url")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "url": "https://x.test/doc",
            "options": "--exclude='a' 'b' --quiet"
        })))
        .with_status(200)
        .with_body("%PDF-1.7 body")
        .create();

    let mut spec = spec_for(&server);
    spec.add_args(Options::new().input_arg("https://x.test/doc"));
    spec.add_arg("--exclude=", ["a", "b"]).add_flag("--quiet");

    let mut sink = TempFile::with_options("", &TempFileOptions::default().suffix(".pdf")).unwrap();
    assert!(spec.execute_into(&mut sink));
    mock.assert();

    assert!(spec.get_executed());
    assert_eq!(sink.content().unwrap(), b"%PDF-1.7 body");
}

#[test]
fn not_found_leaves_sink_unchanged() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/pdf-from-html")
        .match_body(Matcher::Json(json!({
            "html_content": null,
            "options": "--grayscale"
        })))
        .with_status(404)
        .with_body("no such route")
        .create();

    let mut spec = spec_for(&server);
    spec.add_args(Options::new().flag("grayscale"));

    let mut sink = TempFile::new(b"placeholder").unwrap();
    assert!(!spec.execute_into(&mut sink));
    mock.assert();

    assert!(!spec.get_executed());
    assert_eq!(spec.get_error(), "");
    assert_eq!(sink.content().unwrap(), b"placeholder");
}

#[test]
fn temp_file_input_becomes_positional_token() {
    let mut server = Server::new();
    let input = TempFile::with_options("<p>hi</p>", &TempFileOptions::default().suffix(".html"))
        .unwrap();
    let expected_options = format!("{} --page-size 'A4'", input.path().display());
    let mock = server
        .mock("POST", "/pdf-from-html")
        .match_body(Matcher::PartialJson(json!({ "options": expected_options })))
        .with_status(200)
        .with_body("%PDF")
        .create();

    let mut spec = spec_for(&server);
    spec.add_args(Options::new().input(&input).set("page-size", "A4"));

    let mut out: Vec<u8> = Vec::new();
    assert!(spec.execute_into(&mut out));
    mock.assert();
    assert_eq!(out, b"%PDF");
    assert_eq!(out.describe(), "<memory>");
}

#[test]
fn unreachable_service_records_error() {
    let mut spec = CommandSpec::new();
    spec.set_platform(Platform::Unix)
        .set_command("http://127.0.0.1:9")
        .set_timeout(std::time::Duration::from_secs(2));

    let mut out: Vec<u8> = Vec::new();
    assert!(!spec.execute_into(&mut out));
    assert!(!spec.get_executed());
    assert!(spec
        .get_error()
        .contains("Failed to reach conversion service"));
    assert!(out.is_empty());
}
