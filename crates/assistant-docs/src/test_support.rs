//! Fixtures shared by unit tests

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, encryption, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::providers::local::{LocalObjectStore, SqliteDocumentTable};

/// Build a PDF where each page shows the given text items, one `Tj` each
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = build(pages);
    save(&mut doc)
}

/// Same as [`pdf_with_pages`] with an information dictionary
pub fn pdf_with_info(pages: &[&[&str]], title: &str, author: &str) -> Vec<u8> {
    let mut doc = build(pages);
    let info_id = doc.add_object(dictionary! {
        "Title" => lopdf::text_string(title),
        "Author" => lopdf::text_string(author),
    });
    doc.trailer.set("Info", info_id);
    save(&mut doc)
}

/// Three pages whose text passes the quality check, with the page
/// keywords "Alpha", "Beta" and "Gamma"
pub fn alpha_beta_gamma_pdf() -> Vec<u8> {
    pdf_with_pages(&[
        &["Alpha", "quarterly revenue summary for the northern region"],
        &["Beta", "customer retention figures and renewal pipeline"],
        &["Gamma", "projected hiring plan for the next fiscal year"],
    ])
}

/// Config whose local object store lives under `dir`
pub fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.local_root = dir.join("objects");
    config.database.path = dir.join("documents.db");
    config
}

/// Filesystem object store under `config.storage.local_root` plus an
/// in-memory document table
pub fn local_backend(config: &AppConfig) -> (Arc<LocalObjectStore>, Arc<SqliteDocumentTable>) {
    let store = LocalObjectStore::new(config.storage.local_root.clone()).expect("object store");
    let table = SqliteDocumentTable::in_memory().expect("document table");
    (Arc::new(store), Arc::new(table))
}

/// One page showing `text` in Helvetica with `/WinAnsiEncoding`
pub fn pdf_with_winansi_text(text: &[u8]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let line = text_line(0, "Tj", Object::String(text.to_vec(), StringFormat::Literal));
    let mut doc = assemble(doc, font_id, vec![line]);
    save(&mut doc)
}

/// One page showing `text` through a Type0 font with `/Identity-H`
/// encoding. Glyph ids are assigned per distinct character and mapped back
/// by the font's `ToUnicode` CMap.
pub fn pdf_with_identity_font(text: &str) -> Vec<u8> {
    let mut glyphs: Vec<char> = Vec::new();
    let mut codes = Vec::new();
    for ch in text.chars() {
        let index = match glyphs.iter().position(|&glyph| glyph == ch) {
            Some(index) => index,
            None => {
                glyphs.push(ch);
                glyphs.len() - 1
            }
        };
        codes.extend_from_slice(&(index as u16 + 1).to_be_bytes());
    }

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    cmap.push_str(&format!("{} beginbfchar\n", glyphs.len()));
    for (index, glyph) in glyphs.iter().enumerate() {
        cmap.push_str(&format!("<{:04X}> <{:04X}>\n", index + 1, *glyph as u32));
    }
    cmap.push_str("endbfchar\nendcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");

    let mut doc = Document::with_version("1.5");
    let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, cmap.into_bytes()));
    let descendant_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "NotoSans-Regular",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "CIDToGIDMap" => "Identity",
    });
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "NotoSans-Regular",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![descendant_id.into()],
        "ToUnicode" => to_unicode_id,
    });
    let line = text_line(0, "Tj", Object::String(codes, StringFormat::Hexadecimal));
    let mut doc = assemble(doc, font_id, vec![line]);
    save(&mut doc)
}

/// One page with a single `TJ` over `parts` (strings and kerning offsets)
pub fn pdf_with_shown_array(parts: Vec<Object>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let font_id = doc.add_object(helvetica());
    let line = text_line(0, "TJ", Object::Array(parts));
    let mut doc = assemble(doc, font_id, vec![line]);
    save(&mut doc)
}

/// Same as [`pdf_with_pages`], RC4-encrypted (40-bit, revision 2) under
/// the empty user password
pub fn encrypted_pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = build(pages);
    let file_id = b"assistant-docs-fixture-id".to_vec();
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "O" => Object::String(vec![0x4F; 32], StringFormat::Hexadecimal),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
            Object::String(file_id, StringFormat::Hexadecimal),
        ],
    );

    let key = encryption::get_encryption_key(&doc, "", false).expect("encryption key");
    // Revision 2 password check value: the padding encrypted with the file key
    let user_check = rc4(&key, &PASSWORD_PADDING);
    doc.get_object_mut(encrypt_id)
        .and_then(Object::as_dict_mut)
        .expect("encrypt dictionary")
        .set("U", Object::String(user_check, StringFormat::Hexadecimal));

    let ids: Vec<ObjectId> = doc
        .objects
        .keys()
        .copied()
        .filter(|id| *id != encrypt_id)
        .collect();
    for id in ids {
        // RC4 is symmetric, so the decryption routine also encrypts
        let cipher = match encryption::decrypt_object(&key, id, &doc.objects[&id]) {
            Ok(cipher) => cipher,
            Err(_) => continue,
        };
        match doc.objects.get_mut(&id) {
            Some(Object::Stream(stream)) => stream.set_content(cipher),
            Some(Object::String(bytes, _)) => *bytes = cipher,
            _ => {}
        }
    }

    save(&mut doc)
}

const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut state: Vec<u8> = (0..=255).collect();
    let mut j: u8 = 0;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, j as usize);
    }

    let (mut i, mut j) = (0u8, 0u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[i as usize]);
            state.swap(i as usize, j as usize);
            byte ^ state[state[i as usize].wrapping_add(state[j as usize]) as usize]
        })
        .collect()
}

fn helvetica() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    }
}

fn text_line(line: usize, operator: &str, operand: Object) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), (720 - 16 * line as i64).into()]),
        Operation::new(operator, vec![operand]),
        Operation::new("ET", vec![]),
    ]
}

fn build(pages: &[&[&str]]) -> Document {
    let mut doc = Document::with_version("1.5");
    let font_id = doc.add_object(helvetica());
    let contents = pages
        .iter()
        .map(|items| {
            items
                .iter()
                .enumerate()
                .flat_map(|(i, item)| text_line(i, "Tj", Object::string_literal(*item)))
                .collect()
        })
        .collect();
    assemble(doc, font_id, contents)
}

/// Page tree with one page per operation list, all using `font_id` as `/F1`
fn assemble(mut doc: Document, font_id: ObjectId, pages: Vec<Vec<Operation>>) -> Document {
    let pages_id = doc.new_object_id();
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save pdf");
    buffer
}
