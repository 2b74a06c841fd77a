//! ICD-10 adapter: builds a codex from the WHO's ClaML XML export
//!
//! Every `<Class>` element becomes one entry. Chapters are attached to the
//! root right away; everything else is linked in a second pass that follows
//! the `<SubClass>` references, so the document order does not matter.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, instrument, warn};

use crate::application::error_ext::IoResultExt;
use crate::application::progress::{phase_bar, phase_spinner};
use crate::application::xml::{attribute, normalize_text, xml_error};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Codex, Entry, EntryId, EntryKind, Revision};

/// One `<Class>` element of a ClaML document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub code: String,
    pub kind: String,
    pub super_class: Option<String>,
    pub sub_classes: Vec<String>,
    pub title: Option<String>,
}

/// The parts of a ClaML document the codex is built from.
#[derive(Debug, Default, Clone)]
pub struct ClamlDocument {
    pub title: String,
    pub release: String,
    pub classes: Vec<ClassRecord>,
}

/// Load an ICD-10 codex from a ClaML file.
#[instrument(level = "debug")]
pub fn load(path: &Path, progress: bool) -> ApplicationResult<Codex> {
    let content = fs::read_to_string(path).with_path_context("read ClaML file", path)?;
    from_xml_str(&content, path, progress)
}

/// Build an ICD-10 codex from ClaML content; `origin` only labels errors.
pub fn from_xml_str(content: &str, origin: &Path, progress: bool) -> ApplicationResult<Codex> {
    let spinner = phase_spinner("Parsing XML", progress);
    let document = parse_claml(content, origin)?;
    spinner.finish_and_clear();
    info!(
        "parsed {} classes of ICD-10 release {}",
        document.classes.len(),
        document.release
    );
    build_codex(&document, origin, progress)
}

/// Extract title, release and classes from a ClaML document.
pub fn parse_claml(content: &str, path: &Path) -> ApplicationResult<ClamlDocument> {
    let mut reader = Reader::from_str(content);
    let mut document = ClamlDocument::default();

    let mut in_title = false;
    let mut current: Option<ClassRecord> = None;
    let mut in_preferred_rubric = false;
    let mut label: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| xml_error(path, e))? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"Title" if current.is_none() => {
                    in_title = true;
                    document.release = attribute(e, b"version", path)?.unwrap_or_default();
                }
                b"Class" => current = Some(start_class(e, path)?),
                b"Rubric" if current.is_some() => {
                    in_preferred_rubric = attribute(e, b"kind", path)?.as_deref() == Some("preferred");
                }
                b"Label" if in_preferred_rubric => {
                    if current.as_ref().is_some_and(|c| c.title.is_none()) {
                        label = Some(String::new());
                    }
                }
                other => link_class(&mut current, other, e, path)?,
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"Class" => document.classes.push(start_class(e, path)?),
                other => link_class(&mut current, other, e, path)?,
            },
            Event::Text(ref e) => {
                let text = e.unescape().map_err(|err| xml_error(path, err))?;
                if let Some(label) = label.as_mut() {
                    label.push_str(&text);
                } else if in_title {
                    document.title.push_str(&text);
                }
            }
            Event::CData(ref e) => {
                if let Some(label) = label.as_mut() {
                    label.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"Title" => in_title = false,
                b"Label" => {
                    if let (Some(text), Some(class)) = (label.take(), current.as_mut()) {
                        class.title = Some(normalize_text(&text));
                    }
                }
                b"Rubric" => in_preferred_rubric = false,
                b"Class" => {
                    if let Some(class) = current.take() {
                        document.classes.push(class);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    document.title = normalize_text(&document.title);
    Ok(document)
}

fn start_class(e: &BytesStart<'_>, path: &Path) -> ApplicationResult<ClassRecord> {
    let code = attribute(e, b"code", path)?
        .ok_or_else(|| ApplicationError::source_format(path, "<Class> without code attribute"))?;
    let kind = attribute(e, b"kind", path)?.unwrap_or_default();
    Ok(ClassRecord {
        code,
        kind,
        ..Default::default()
    })
}

/// Record `<SuperClass>`/`<SubClass>` references of the open class.
fn link_class(
    current: &mut Option<ClassRecord>,
    name: &[u8],
    e: &BytesStart<'_>,
    path: &Path,
) -> ApplicationResult<()> {
    let Some(class) = current.as_mut() else {
        return Ok(());
    };
    match name {
        b"SuperClass" => class.super_class = attribute(e, b"code", path)?,
        b"SubClass" => {
            if let Some(code) = attribute(e, b"code", path)? {
                class.sub_classes.push(code);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Create all entries, then connect them along their subclass references.
pub fn build_codex(document: &ClamlDocument, path: &Path, progress: bool) -> ApplicationResult<Codex> {
    let rules = Revision::Rev10.rules();
    let mut codex = Codex::with_revision(Revision::Rev10, rules.format_title(&document.title), &document.release);
    let root = codex.root();
    let mut by_code: HashMap<&str, (usize, EntryId)> = HashMap::with_capacity(document.classes.len());

    let pb = phase_bar(document.classes.len() as u64, "Create entries", progress);
    for (i, class) in document.classes.iter().enumerate() {
        let title = match class.title.as_deref() {
            Some(title) => rules.format_title(title),
            None => {
                warn!("class {} has no preferred label", class.code);
                String::new()
            }
        };
        let entry = Entry::parse(class.code.as_str(), title, &class.kind)?;
        let id = match entry.kind {
            EntryKind::Chapter => codex.insert_under(Entry::chapter(&entry.code, entry.title), root)?,
            _ => codex.insert(entry)?,
        };
        by_code.insert(class.code.as_str(), (i, id));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let pb = phase_bar(document.classes.len() as u64, "Append entries to tree", progress);
    for class in &document.classes {
        let (_, id) = by_code[class.code.as_str()];
        for sub_code in &class.sub_classes {
            let &(sub_index, sub_id) = by_code.get(sub_code.as_str()).ok_or_else(|| {
                ApplicationError::source_format(
                    path,
                    format!("class {} references unknown subclass {}", class.code, sub_code),
                )
            })?;
            if let Some(super_code) = &document.classes[sub_index].super_class {
                if super_code != &class.code {
                    return Err(ApplicationError::source_format(
                        path,
                        format!(
                            "subclass {} names {} as superclass, not {}",
                            sub_code, super_code, class.code
                        ),
                    ));
                }
            }
            codex.add_child(id, sub_id)?;
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    debug!("built ICD-10 codex with {} entries", codex.len(root));
    Ok(codex)
}
