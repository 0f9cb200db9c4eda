//! Concatenation of in-memory documents into one bundle.
//!
//! Pure page-stream concatenation: every part's pages are re-parented under
//! a fresh page tree in input order. No page content is touched here;
//! watermarking and numbering are later whole-document passes
//! (`pdf::decorate`).

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};

/// A named document to concatenate. The name only serves error reporting,
/// so a failing input can be pointed at.
pub struct Part {
    pub name: String,
    pub doc: Document,
}

impl Part {
    pub fn new(name: impl Into<String>, doc: Document) -> Self {
        Self {
            name: name.into(),
            doc,
        }
    }
}

/// Page-tree attributes that may be inherited from ancestor Pages nodes and
/// must be inlined before a page is re-parented.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Concatenate `parts` into a single document, preserving part order and
/// page order within each part.
pub fn concatenate(parts: Vec<Part>) -> Result<Document> {
    if parts.is_empty() {
        return Err(Error::NoAppendices);
    }

    let mut bundle = Document::with_version("1.5");
    let mut max_id: u32 = 1;
    let mut page_entries: Vec<(ObjectId, Dictionary)> = Vec::new();

    for part in parts {
        let Part { name, mut doc } = part;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // Page order within the part follows its page tree
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for page_id in &page_ids {
            let dict = page_dict_with_inherited(&doc, *page_id).map_err(|e| Error::Compose {
                part: name.clone(),
                reason: e.to_string(),
            })?;
            page_entries.push((*page_id, dict));
        }

        // Copy everything except the old page tree; pages are re-inserted
        // below with a new parent
        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    bundle.objects.insert(object_id, object);
                }
            }
        }
    }

    // The copied objects occupy ids below max_id; keep allocating above them
    bundle.max_id = max_id;
    let pages_id = bundle.new_object_id();

    let mut kids = Vec::with_capacity(page_entries.len());
    for (page_id, mut dict) in page_entries {
        dict.set("Parent", Object::Reference(pages_id));
        bundle.objects.insert(page_id, Object::Dictionary(dict));
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len())
        .map_err(|_| Error::Lopdf("page count overflow".to_string()))?;
    let pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
    ]);
    bundle.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = bundle.new_object_id();
    let catalog_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    bundle
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    bundle.trailer.set("Root", Object::Reference(catalog_id));
    #[allow(clippy::cast_possible_truncation)]
    let new_max_id = bundle.objects.len() as u32;
    bundle.max_id = new_max_id;
    bundle.renumber_objects();

    Ok(bundle)
}

/// Clone a page dictionary, inlining attributes inherited from ancestor
/// Pages nodes. The old page tree is not copied into the bundle, so
/// anything stored there would otherwise be lost.
fn page_dict_with_inherited(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let page = doc
        .get_object(page_id)
        .map_err(|e| Error::Lopdf(format!("failed to get page object: {e}")))?;

    let Object::Dictionary(dict) = page else {
        return Err(Error::Lopdf(format!(
            "page object {page_id:?} is not a dictionary"
        )));
    };

    let mut dict = dict.clone();
    for key in INHERITABLE_KEYS {
        if dict.get(key).is_err()
            && let Some(value) = resolve_inherited(doc, &dict, key, 10)
        {
            dict.set(key, value);
        }
    }
    Ok(dict)
}

/// Walk up the Parent chain looking for an inheritable attribute.
///
/// Depth-limited to survive malformed PDFs with circular Parent references.
fn resolve_inherited(
    doc: &Document,
    dict: &Dictionary,
    key: &[u8],
    depth: usize,
) -> Option<Object> {
    if depth == 0 {
        return None;
    }

    let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") else {
        return None;
    };
    let Ok(Object::Dictionary(parent)) = doc.get_object(*parent_id) else {
        return None;
    };

    if let Ok(value) = parent.get(key) {
        return Some(value.clone());
    }
    resolve_inherited(doc, parent, key, depth - 1)
}
