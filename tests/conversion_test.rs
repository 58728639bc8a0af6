use std::collections::HashSet;

use html2docx::config::ConverterConfig;
use html2docx::document::models::{LinkTarget, TextAlignment};
use html2docx::{Block, Converter, Document, Inline, Paragraph, ParagraphKind};

fn convert(html: &str) -> Document {
    Converter::new(ConverterConfig::default())
        .convert(html)
        .expect("conversion should succeed")
}

/// Top-level paragraphs after the title
fn body_paragraphs(doc: &Document) -> Vec<&Paragraph> {
    doc.paragraphs().skip(1).collect()
}

fn list_numbering(para: &Paragraph) -> (usize, usize) {
    match para.kind {
        ParagraphKind::ListItem { numbering, level } => (numbering.0, level),
        other => panic!("expected a list paragraph, got {other:?}"),
    }
}

fn cell_paragraphs(blocks: &[Block]) -> Vec<&Paragraph> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph(para) => Some(para),
            Block::Table(_) => None,
        })
        .collect()
}

#[test]
fn test_bold_and_italic_are_scoped_to_their_subtrees() {
    let doc = convert("<p><b><i>both</i></b><i>italic</i></p>");
    let para = body_paragraphs(&doc)[0];
    let runs: Vec<_> = para.runs().collect();

    assert_eq!(runs[0].text, "both");
    assert!(runs[0].formatting.bold && runs[0].formatting.italic);
    assert_eq!(runs[1].text, "italic");
    assert!(!runs[1].formatting.bold, "bold must not leak into a sibling");
    assert!(runs[1].formatting.italic);
}

#[test]
fn test_four_run_paragraph() {
    let doc = convert(r#"<p>a<span style="color:#112233">b</span><strong>c<em>d</em></strong></p>"#);
    let para = body_paragraphs(&doc)[0];
    let runs: Vec<_> = para.runs().collect();

    assert_eq!(runs.len(), 4);
    assert_eq!(runs[0].text, "a");
    assert!(!runs[0].formatting.bold && runs[0].formatting.color.is_none());
    assert_eq!(runs[1].text, "b");
    assert_eq!(runs[1].formatting.color.as_deref(), Some("112233"));
    assert_eq!(runs[2].text, "c");
    assert!(runs[2].formatting.bold && !runs[2].formatting.italic);
    assert_eq!(runs[3].text, "d");
    assert!(runs[3].formatting.bold && runs[3].formatting.italic);
}

#[test]
fn test_span_styles_cascade() {
    let doc = convert(
        r#"<p><span style="background-color: rgb(255, 255, 0); font-family: Arial Bold">x<span style="color: #00AA00">y</span></span><mark>z</mark></p>"#,
    );
    let para = body_paragraphs(&doc)[0];
    let runs: Vec<_> = para.runs().collect();

    assert_eq!(runs[0].formatting.background.as_deref(), Some("FFFF00"));
    assert!(runs[0].formatting.bold);
    assert_eq!(runs[1].formatting.background.as_deref(), Some("FFFF00"));
    assert_eq!(runs[1].formatting.color.as_deref(), Some("00AA00"));
    assert!(runs[2].formatting.highlight);
    assert!(runs[2].formatting.background.is_none());
}

#[test]
fn test_unparseable_colour_keeps_default() {
    let doc = convert(r#"<p><span style="color: tomato; text-align">x</span></p>"#);
    let run = body_paragraphs(&doc)[0].runs().next().unwrap();
    assert!(run.formatting.color.is_none());
}

#[test]
fn test_only_spans_colour_their_runs() {
    let doc = convert(
        r#"<p style="color:#FF0000; text-align: right">plain <span style="color:#0000FF">blue</span></p>
           <table><tr><td style="background-color:#FFFF00">cell</td></tr></table>"#,
    );
    let para = body_paragraphs(&doc)[0];
    assert_eq!(para.alignment, Some(TextAlignment::Right));
    let runs: Vec<_> = para.runs().collect();
    assert_eq!(runs[0].formatting.color, None);
    assert_eq!(runs[1].formatting.color.as_deref(), Some("0000FF"));

    let table = doc.tables().next().unwrap();
    let cell = cell_paragraphs(&table.rows[0][0].blocks)[0];
    assert_eq!(cell.runs().next().unwrap().formatting.background, None);
}

#[test]
fn test_line_breaks() {
    let doc = convert("<p>one<br>two</p>");
    let para = body_paragraphs(&doc)[0];
    assert!(matches!(para.inlines[1], Inline::Break));
    assert_eq!(para.text(), "one\ntwo");
}

#[test]
fn test_list_after_a_gap_continues_numbering() {
    let doc = convert("<ol><li>a</li><li>b</li></ol><p>gap</p><ol><li>c</li></ol>");
    let paras = body_paragraphs(&doc);

    let (first, _) = list_numbering(paras[0]);
    let (second, _) = list_numbering(paras[1]);
    let (continued, _) = list_numbering(paras[3]);
    assert_eq!(first, second);
    assert_eq!(first, continued);
    assert_eq!(doc.numberings.len(), 1);
}

#[test]
fn test_numbered_pair_by_item_values() {
    let doc = convert(r#"<ol><li value="3">a</li></ol><ol><li value="4">b</li></ol>"#);
    let paras = body_paragraphs(&doc);
    assert_eq!(list_numbering(paras[0]).0, list_numbering(paras[1]).0);
}

#[test]
fn test_start_attribute_restarts_numbering() {
    let doc = convert(r#"<ol start="5"><li>a</li></ol>"#);
    let (id, _) = list_numbering(body_paragraphs(&doc)[0]);
    let instance = doc
        .numbering(html2docx::document::models::NumberingId(id))
        .unwrap();
    assert!(instance.ordered);
    assert_eq!(instance.start, Some(5));
}

#[test]
fn test_bullets_never_continue() {
    let doc = convert("<ul><li>a</li></ul><p>gap</p><ul><li>b</li></ul>");
    let paras = body_paragraphs(&doc);
    assert_ne!(list_numbering(paras[0]).0, list_numbering(paras[2]).0);
    assert!(doc.numberings.iter().all(|n| !n.ordered && n.start.is_none()));
}

#[test]
fn test_nested_lists_indent_per_level() {
    let doc = convert("<ol><li>outer<ul><li>inner</li></ul></li><li>next</li></ol>");
    let paras = body_paragraphs(&doc);

    assert_eq!(paras.len(), 3);
    assert_eq!(paras[0].text(), "outer");
    assert_eq!(paras[1].text(), "inner");
    assert_eq!(paras[2].text(), "next");

    let (outer, outer_level) = list_numbering(paras[0]);
    let (inner, inner_level) = list_numbering(paras[1]);
    assert_eq!((outer_level, inner_level), (0, 1));
    assert_ne!(outer, inner);
    assert_eq!(list_numbering(paras[2]).0, outer);

    assert_eq!(paras[0].indent_left, Some(360));
    assert_eq!(paras[1].indent_left, Some(720));
}

#[test]
fn test_list_item_paragraphs_and_alignment() {
    let doc = convert(
        r#"<ul><li><p id="first">one</p><p style="text-align: right">two</p></li></ul>"#,
    );
    let paras = body_paragraphs(&doc);
    assert_eq!(paras.len(), 2);
    assert_eq!(paras[0].bookmark_names(), vec!["first"]);
    assert_eq!(paras[1].alignment, Some(TextAlignment::Right));
    assert_eq!(list_numbering(paras[0]).0, list_numbering(paras[1]).0);
}

#[test]
fn test_empty_list_is_a_no_op() {
    let doc = convert("<ol></ol><ul>\n</ul>");
    assert_eq!(doc.blocks.len(), 1);
    assert!(doc.numberings.is_empty());
}

#[test]
fn test_table_in_list_item_follows_the_item() {
    let doc = convert("<ol><li>item<table><tr><td>x</td></tr></table></li></ol>");
    assert!(matches!(&doc.blocks[1], Block::Paragraph(p) if p.text() == "item"));
    assert!(matches!(&doc.blocks[2], Block::Table(_)));
}

#[test]
fn test_ragged_table_pads_missing_cells() {
    let doc = convert(
        "<table><tr><td>a</td><td>b</td><td>c</td></tr><tr><td>d</td><td>e</td></tr></table>",
    );
    let table = doc.tables().next().unwrap();

    assert_eq!(table.columns, 3);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1].len(), 3);
    assert!(table.rows[1][2].blocks.is_empty());
    assert_eq!(cell_paragraphs(&table.rows[1][1].blocks)[0].text(), "e");
}

#[test]
fn test_table_cells_hold_block_content() {
    let doc = convert(
        r#"<table><tr>
            <td style="text-align: center"><p>one</p><p>two</p></td>
            <td><h3>Head</h3><ul><li>point</li></ul></td>
            <td><table><tr><td>inner</td></tr></table></td>
        </tr></table>"#,
    );
    let table = doc.tables().next().unwrap();
    let row = &table.rows[0];

    let first = cell_paragraphs(&row[0].blocks);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].alignment, Some(TextAlignment::Center));

    let second = cell_paragraphs(&row[1].blocks);
    assert_eq!(second[0].kind, ParagraphKind::Heading(3));
    assert!(matches!(second[1].kind, ParagraphKind::ListItem { .. }));

    assert!(matches!(row[2].blocks[0], Block::Table(_)));
    assert_eq!(doc.tables().count(), 1, "nested tables stay inside their cell");
}

#[test]
fn test_bookmark_spans_and_anchor_links() {
    let doc = convert(
        r#"<p><a class="legal anchor-link">terms</a> and <a class="nowhere anchor-link">missing</a></p>
           <p><span class="bookmark" id="legal" name="Legal_Terms">Terms apply</span></p>
           <p><span class="anchor" id="spot"></span>Here</p>"#,
    );
    let paras = body_paragraphs(&doc);

    let links = paras[0].hyperlinks();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].0, &LinkTarget::Internal("Legal_Terms".to_string()));
    assert_eq!(paras[0].text(), "terms and missing");

    assert_eq!(paras[1].bookmark_names(), vec!["Legal_Terms"]);
    assert_eq!(paras[1].text(), "Terms apply");
    assert_eq!(paras[2].bookmark_names(), vec!["spot"]);
}

#[test]
fn test_inline_ids_become_link_targets() {
    let doc = convert(
        r##"<p>See <span id="ref">here</span> and <b id="bold-ref">b</b></p>
           <ul><li><em id="li-ref">item</em></li></ul>
           <p><a href="#ref">back</a> <a class="li-ref anchor-link">li</a> <a href="#bold-ref">bold</a></p>"##,
    );
    let paras = body_paragraphs(&doc);
    assert_eq!(paras[0].bookmark_names(), vec!["ref", "bold-ref"]);
    assert_eq!(paras[0].text(), "See here and b");
    assert_eq!(paras[1].bookmark_names(), vec!["li-ref"]);
    assert_eq!(paras[1].text(), "item");

    let names: HashSet<&str> = doc
        .paragraphs()
        .flat_map(|para| para.bookmark_names())
        .collect();
    let links = paras[2].hyperlinks();
    assert_eq!(links.len(), 3);
    for (target, _) in links {
        match target {
            LinkTarget::Internal(name) => {
                assert!(names.contains(name.as_str()), "no bookmark for {name:?}")
            }
            LinkTarget::External(url) => panic!("expected an internal link, got {url}"),
        }
    }
}

#[test]
fn test_duplicate_ids_get_one_bookmark() {
    let doc = convert(r#"<h1 id="dup">One</h1><h1 id="dup">Two</h1>"#);
    let paras = body_paragraphs(&doc);
    assert_eq!(paras[0].bookmark_names(), vec!["dup"]);
    assert!(paras[1].bookmark_names().is_empty());
}

#[test]
fn test_long_anchor_ids_match_their_links() {
    let id = "chapter-one-introduction-and-overview-of-the-whole-system";
    let html = format!(r##"<p><a href="#{id}">jump</a></p><h2 id="{id}">Intro</h2>"##);
    let doc = convert(&html);
    let paras = body_paragraphs(&doc);

    let expected: String = id.chars().take(40).collect();
    assert_eq!(paras[0].hyperlinks()[0].0, &LinkTarget::Internal(expected.clone()));
    assert_eq!(paras[1].bookmark_names(), vec![expected.as_str()]);
}

#[test]
fn test_configured_bookmark_length() {
    let config = ConverterConfig {
        max_bookmark_len: 8,
        ..ConverterConfig::default()
    };
    let doc = Converter::new(config)
        .convert(r##"<p><a href="#abcdefghijkl">x</a></p><p id="abcdefghijkl">t</p>"##)
        .unwrap();
    let paras: Vec<_> = doc.paragraphs().skip(1).collect();
    assert_eq!(paras[1].bookmark_names(), vec!["abcdefgh"]);
}

#[test]
fn test_configured_hyperlink_colour_is_normalised() {
    let config = ConverterConfig {
        hyperlink_color: "#1a2b3c".to_string(),
        ..ConverterConfig::default()
    };
    let doc = Converter::new(config)
        .convert(r#"<p><a href="https://example.com">site</a></p>"#)
        .unwrap();
    let para = doc.paragraphs().nth(1).unwrap();
    let Some(Inline::Hyperlink { runs, .. }) = para.inlines.first() else {
        panic!("expected a hyperlink, got {:?}", para.inlines);
    };
    assert_eq!(runs[0].formatting.color.as_deref(), Some("1A2B3C"));
}

#[test]
fn test_headings_and_sections() {
    let doc = convert(
        "<section><h1>One</h1><article><h4>Four</h4><blockquote><p>quoted</p></blockquote></article></section>",
    );
    let paras = body_paragraphs(&doc);
    assert_eq!(paras[0].kind, ParagraphKind::Heading(1));
    assert_eq!(paras[1].kind, ParagraphKind::Heading(4));
    assert_eq!(paras[2].text(), "quoted");
}

#[test]
fn test_sample_fixture() {
    let html = std::fs::read_to_string("tests/fixtures/sample.html").unwrap();
    let doc = convert(&html);

    assert_eq!(doc.title, "Quarterly Report");
    let paras = body_paragraphs(&doc);
    assert_eq!(paras[0].kind, ParagraphKind::Heading(1));
    assert_eq!(paras[1].alignment, Some(TextAlignment::Justify));
    assert_eq!(
        paras[1].hyperlinks()[0].0,
        &LinkTarget::Internal("details".to_string())
    );

    let ordered: Vec<_> = paras
        .iter()
        .filter_map(|p| match p.kind {
            ParagraphKind::ListItem { numbering, level: 0 } => {
                doc.numbering(numbering).filter(|n| n.ordered).map(|n| n.id)
            }
            _ => None,
        })
        .collect();
    // two items in the first list, one in the continued list
    assert_eq!(ordered.len(), 3);
    assert!(ordered.iter().all(|id| *id == ordered[0]));

    assert_eq!(doc.tables().next().unwrap().columns, 3);
}
