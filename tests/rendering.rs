use pdf_facade::{
    fonts, metadata, Orientation, OutputMode, RenderConfiguration, RenderFacade, Section,
};
use lopdf::content::Content;
use lopdf::Object;
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "fonts missing. Set PDF_FACADE_FONTS_DIR or copy assets/fonts next to the binary.";

fn fonts_available() -> bool {
    fonts::font_family_available(&RenderConfiguration::default().font)
}

fn sample_configuration() -> RenderConfiguration {
    RenderConfiguration::default()
        .with_markup(Section::Header, "<p style=\"text-align: right\">Quarterly report</p>")
        .with_markup(Section::Footer, "<p>Page {PAGENO}</p>")
        .with_markup(
            Section::Main,
            "<h1>Summary</h1><p>Hello, <b>PDF</b>!</p><ul><li>one</li><li>two</li></ul>",
        )
}

fn render_sample_pdf() -> Option<Vec<u8>> {
    if !fonts_available() {
        return None;
    }

    let mut facade: RenderFacade = RenderFacade::with_configuration(sample_configuration());
    let response = facade
        .download("sample.pdf", OutputMode::Inline)
        .expect("render sample pdf");
    Some(response.into_bytes())
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_non_empty_output() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping renders_non_empty_output: {SKIP_HINT}");
        return;
    };
    assert!(bytes.starts_with(b"%PDF"), "output should be a PDF document");
    assert_eq!(metadata::page_count(&bytes).expect("parse output"), 1);
}

#[test]
fn rendering_is_deterministic() {
    let Some(bytes_a) = render_sample_pdf() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_HINT}");
        return;
    };
    let Some(bytes_b) = render_sample_pdf() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_HINT}");
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");

    let hash_a = normalized_hash(&bytes_a);
    let hash_b = normalized_hash(&bytes_b);

    assert_eq!(
        hash_a, hash_b,
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn author_is_written_to_metadata() {
    if !fonts_available() {
        eprintln!("Skipping author_is_written_to_metadata: {SKIP_HINT}");
        return;
    }

    let mut facade: RenderFacade = RenderFacade::with_configuration(sample_configuration());
    facade.set("author", "Ada Lovelace").expect("set author");
    let bytes = facade
        .download("sample.pdf", OutputMode::Attachment)
        .expect("render")
        .into_bytes();

    assert_eq!(
        metadata::author(&bytes).expect("parse output").as_deref(),
        Some("Ada Lovelace")
    );
}

#[test]
fn page_breaks_and_page_count_pass_through() {
    if !fonts_available() {
        eprintln!("Skipping page_breaks_and_page_count_pass_through: {SKIP_HINT}");
        return;
    }

    let config = RenderConfiguration::default()
        .with_orientation(Orientation::Landscape)
        .with_markup(Section::Main, "<p>first</p><pagebreak /><p>second</p>");
    let mut facade: RenderFacade = RenderFacade::with_configuration(config);
    facade.apply_markup().expect("apply markup");

    let pages = facade.call("page_count", &[]).expect("page count");
    assert_eq!(pages.as_usize(), Some(2));
    assert_eq!(
        facade.call("orientation", &[]).expect("orientation").as_str(),
        Some("L")
    );
}

#[test]
fn save_writes_a_pdf_file() {
    if !fonts_available() {
        eprintln!("Skipping save_writes_a_pdf_file: {SKIP_HINT}");
        return;
    }

    let path = std::env::temp_dir().join(format!("pdf_facade_save_{}.pdf", std::process::id()));
    let mut facade: RenderFacade = RenderFacade::with_configuration(sample_configuration());
    facade.save(&path).expect("save");

    let bytes = std::fs::read(&path).expect("read saved file");
    let _ = std::fs::remove_file(&path);
    assert!(bytes.starts_with(b"%PDF"));
}

/// Text shown by each page's content stream, in page order.
fn page_texts(bytes: &[u8]) -> Vec<String> {
    fn collect_strings(object: &Object, text: &mut String) {
        match object {
            Object::String(codes, _) => {
                let two_byte = codes.len() % 2 == 0 && codes.chunks(2).all(|pair| pair[0] == 0);
                if two_byte {
                    text.extend(codes.chunks(2).map(|pair| pair[1] as char));
                } else {
                    text.extend(codes.iter().map(|&code| code as char));
                }
            }
            Object::Array(items) => {
                for item in items {
                    collect_strings(item, text);
                }
            }
            _ => {}
        }
    }

    let document = lopdf::Document::load_mem(bytes).expect("parse output");
    document
        .get_pages()
        .values()
        .map(|&page_id| {
            let content = document.get_page_content(page_id).expect("page content");
            let content = Content::decode(&content).expect("decode content");
            let mut text = String::new();
            for operation in &content.operations {
                if operation.operator == "Tj" || operation.operator == "TJ" {
                    for operand in &operation.operands {
                        collect_strings(operand, &mut text);
                    }
                }
            }
            text
        })
        .collect()
}

#[test]
fn header_can_skip_the_first_page() {
    if !fonts_available() {
        eprintln!("Skipping header_can_skip_the_first_page: {SKIP_HINT}");
        return;
    }

    for show_on_first_page in [true, false] {
        let config = RenderConfiguration::default()
            .with_markup(Section::Header, "<p>HDRMARK</p>")
            .with_markup(Section::Main, "<p>first</p><pagebreak /><p>second</p>");
        let mut facade: RenderFacade = RenderFacade::with_configuration(config);
        facade
            .set("headerFirstPage", show_on_first_page)
            .expect("set flag");
        let bytes = facade
            .download("header.pdf", OutputMode::Inline)
            .expect("render")
            .into_bytes();

        let pages = page_texts(&bytes);
        assert_eq!(pages.len(), 2);
        assert_eq!(
            pages[0].contains("HDRMARK"),
            show_on_first_page,
            "page 1: {:?}",
            pages[0]
        );
        assert!(pages[1].contains("HDRMARK"), "page 2: {:?}", pages[1]);
        assert!(pages[1].contains("second"), "page 2: {:?}", pages[1]);
    }
}
