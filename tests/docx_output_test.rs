use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::process::Command;

use regex::Regex;
use zip::ZipArchive;

fn read_entry(docx: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(docx)).expect("output should be a zip archive");
    let mut entry = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing {name}"));
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    contents
}

#[test]
fn test_title_lands_in_core_properties() {
    let docx = html2docx::html_to_docx(
        "<html><head><title>Budget &amp; Plan</title></head><body><p>x</p></body></html>",
    )
    .unwrap();

    let core = read_entry(&docx, "docProps/core.xml");
    assert!(core.contains("<dc:title>Budget &amp; Plan</dc:title>"));

    let document = read_entry(&docx, "word/document.xml");
    assert!(document.contains("Budget &amp; Plan"));
}

#[test]
fn test_default_title_and_margins() {
    let docx = html2docx::html_to_docx("<p>Hello</p>").unwrap();

    let core = read_entry(&docx, "docProps/core.xml");
    assert!(core.contains("<dc:title>Converted Document</dc:title>"));

    let document = read_entry(&docx, "word/document.xml");
    assert!(document.contains("Hello"));
    assert!(document.contains(r#"w:top="1440""#));
    assert!(document.contains(r#"w:left="1440""#));
}

#[test]
fn test_bookmarks_and_internal_links_are_written() {
    let docx = html2docx::html_to_docx(
        r##"<h1 id="intro">Intro</h1><p>Back to <a href="#intro">the start</a></p>"##,
    )
    .unwrap();

    let document = read_entry(&docx, "word/document.xml");
    assert!(document.contains("w:bookmarkStart"));
    assert!(document.contains(r#"w:name="intro""#));
    assert!(document.contains("w:hyperlink"));
    assert!(document.contains(r#"w:anchor="intro""#));
}

#[test]
fn test_lists_produce_numbering_definitions() {
    let docx = html2docx::html_to_docx("<ol><li>one</li><li>two</li></ol>").unwrap();

    let document = read_entry(&docx, "word/document.xml");
    assert!(document.contains("w:numId"));

    let numbering = read_entry(&docx, "word/numbering.xml");
    assert!(numbering.contains("decimal"));
}

#[test]
fn test_first_list_keeps_its_own_numbering_definition() {
    let docx =
        html2docx::html_to_docx(r#"<ul><li>bullet</li></ul><ol start="5"><li>five</li></ol>"#)
            .unwrap();

    let numbering = read_entry(&docx, "word/numbering.xml");
    let abstract_ids = Regex::new(r#"<w:abstractNum w:abstractNumId="(\d+)""#).unwrap();
    let ids: Vec<&str> = abstract_ids
        .captures_iter(&numbering)
        .map(|caps| caps.get(1).unwrap().as_str())
        .collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len(), "abstract numbering ids collide: {ids:?}");

    let num_ids = Regex::new(r#"<w:num w:numId="(\d+)""#).unwrap();
    let nums: Vec<&str> = num_ids
        .captures_iter(&numbering)
        .map(|caps| caps.get(1).unwrap().as_str())
        .collect();
    let unique: HashSet<&str> = nums.iter().copied().collect();
    assert_eq!(nums.len(), unique.len(), "numbering ids collide: {nums:?}");

    assert!(numbering.contains(r#"w:val="bullet""#));
    assert!(numbering.contains(r#"<w:start w:val="5""#));

    // the bullet list points at its own definition, not the built-in one
    let document = read_entry(&docx, "word/document.xml");
    assert!(document.contains(r#"<w:numId w:val="2""#));
    assert!(document.contains(r#"<w:numId w:val="3""#));
    assert!(!document.contains(r#"<w:numId w:val="1""#));
}

/// Run `f` on a thread with a 2 MiB stack, the default for spawned threads
fn on_small_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .expect("conversion should not overflow the stack")
}

#[test]
fn test_deeply_nested_tables_are_rejected_not_fatal() {
    let result = on_small_stack(|| {
        html2docx::html_to_docx(&("<table><tr><td>".repeat(70) + "deep"))
    });
    assert!(matches!(result, Err(html2docx::ConvertError::Parse(_))));

    let result = on_small_stack(|| html2docx::html_to_docx(&("<div>".repeat(400) + "deep")));
    assert!(matches!(result, Err(html2docx::ConvertError::Parse(_))));
}

#[test]
fn test_moderately_nested_tables_still_convert() {
    let result = on_small_stack(|| {
        html2docx::html_to_docx(&("<table><tr><td>".repeat(20) + "inner"))
    });
    let docx = result.unwrap();
    let document = read_entry(&docx, "word/document.xml");
    assert!(document.contains("inner"));
    assert_eq!(document.matches("<w:tbl>").count(), 20);
}

#[test]
fn test_cli_dump_json() {
    let output = Command::new(env!("CARGO_BIN_EXE_html2docx"))
        .args(["tests/fixtures/sample.html", "--dump-json"])
        .output()
        .expect("Failed to execute html2docx");

    assert!(
        output.status.success(),
        "html2docx should convert the sample: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["title"], "Quarterly Report");
    assert!(json["blocks"].as_array().is_some_and(|blocks| blocks.len() > 5));
}

#[test]
fn test_cli_writes_docx() {
    let out = std::env::temp_dir().join(format!("html2docx-cli-{}.docx", std::process::id()));
    let output = Command::new(env!("CARGO_BIN_EXE_html2docx"))
        .args(["tests/fixtures/sample.html", "-o"])
        .arg(&out)
        .output()
        .expect("Failed to execute html2docx");

    assert!(output.status.success());
    let bytes = std::fs::read(&out).unwrap();
    let core = read_entry(&bytes, "docProps/core.xml");
    assert!(core.contains("Quarterly Report"));
    std::fs::remove_file(&out).ok();
}
