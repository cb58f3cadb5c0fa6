use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use reqwest::{Client, Url};

use crate::error::MenuError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree we are willing to walk before calling it a cycle.
const MAX_TREE_DEPTH: usize = 64;

pub async fn download_document(client: &Client, url: &Url) -> anyhow::Result<Vec<u8>> {
    let bytes = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(bytes.to_vec())
}

pub fn page_count(bytes: &[u8]) -> Result<usize, MenuError> {
    let doc = Document::load_mem(bytes)?;
    Ok(doc.get_pages().len())
}

/// Plain text of a document, used to eyeball which pages were picked.
pub fn extract_text(bytes: &[u8]) -> anyhow::Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes)?;
    Ok(text)
}

/// Builds a new document holding only `indices` (zero-based) of `bytes`, in
/// the order given.
///
/// Objects are carried over under their original ids; a page listed twice is
/// cloned under a fresh id the second time.
pub fn extract_pages(bytes: &[u8], indices: &[usize]) -> Result<Vec<u8>, MenuError> {
    let source = Document::load_mem(bytes)?;
    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
    let tree_nodes = page_tree_nodes(&source, &page_ids)?;

    let mut target = Document::with_version(source.version.clone());
    target.max_id = source.max_id;
    let pages_id = target.new_object_id();

    let mut kids = Vec::with_capacity(indices.len());
    for &index in indices {
        let page_id = *page_ids.get(index).ok_or(MenuError::PageOutOfRange {
            index,
            page_count: page_ids.len(),
        })?;

        let mut page = flatten_page(&source, page_id)?;
        copy_referenced(&source, &mut target, &page, &tree_nodes);
        page.set("Parent", Object::Reference(pages_id));

        let id = if target.objects.contains_key(&page_id) {
            target.add_object(page)
        } else {
            target.objects.insert(page_id, Object::Dictionary(page));
            page_id
        };
        kids.push(Object::Reference(id));
    }

    let count = kids.len() as i64;
    target.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = target.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    target.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    target
        .save_to(&mut out)
        .map_err(|e| MenuError::MalformedDocument(e.to_string()))?;
    Ok(out)
}

/// Every page and every ancestor `Pages` node of the source tree.
fn page_tree_nodes(
    source: &Document,
    page_ids: &[ObjectId],
) -> Result<HashSet<ObjectId>, MenuError> {
    let mut nodes = HashSet::new();
    for &page_id in page_ids {
        let mut current = Some(page_id);
        let mut depth = 0;
        while let Some(id) = current {
            if !nodes.insert(id) {
                break;
            }
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                return Err(MenuError::MalformedDocument(
                    "page tree is too deep".to_string(),
                ));
            }
            current = parent_of(source.get_dictionary(id)?);
        }
    }
    Ok(nodes)
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}

/// The page dictionary with inherited attributes copied down and the link to
/// its old parent removed.
fn flatten_page(source: &Document, page_id: ObjectId) -> Result<Dictionary, MenuError> {
    let mut page = source.get_dictionary(page_id)?.clone();

    let mut parent = parent_of(&page);
    let mut depth = 0;
    while let Some(parent_id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return Err(MenuError::MalformedDocument(
                "page tree is too deep".to_string(),
            ));
        }
        let node = source.get_dictionary(parent_id)?;
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = parent_of(node);
    }

    page.remove(b"Parent");
    Ok(page)
}

/// Copies everything `page` reaches into `target`, without wandering back
/// into the source page tree.
fn copy_referenced(
    source: &Document,
    target: &mut Document,
    page: &Dictionary,
    tree_nodes: &HashSet<ObjectId>,
) {
    let mut pending = Vec::new();
    collect_references_in_dict(page, &mut pending);

    while let Some(id) = pending.pop() {
        if tree_nodes.contains(&id) || target.objects.contains_key(&id) {
            continue;
        }
        // dangling references are legal in PDF and read as null
        let Ok(object) = source.get_object(id) else {
            continue;
        };
        collect_references(object, &mut pending);
        target.objects.insert(id, object.clone());
    }
}

fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        Object::Dictionary(dict) => collect_references_in_dict(dict, out),
        Object::Stream(stream) => collect_references_in_dict(&stream.dict, out),
        _ => {}
    }
}

fn collect_references_in_dict(dict: &Dictionary, out: &mut Vec<ObjectId>) {
    for (_, value) in dict.iter() {
        collect_references(value, out);
    }
}
