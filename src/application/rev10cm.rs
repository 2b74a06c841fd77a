//! ICD-10-CM adapter: builds a codex from the CDC's tabular XML
//!
//! The document nests `<chapter>`, `<section id>` and `<diag>` elements,
//! each carrying `<name>`/`<desc>` children. Entries are assembled bottom-up:
//! an element's entry is created once the element closes, and its already
//! built children are attached to it through `add_child`.

use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, instrument};

use crate::application::error_ext::IoResultExt;
use crate::application::progress::phase_spinner;
use crate::application::xml::{attribute, normalize_text, xml_error};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Codex, Entry, EntryId, EntryKind, Revision};

/// Root title of an ICD-10-CM codex.
pub fn root_title(release: &str) -> String {
    format!(
        "International Classification of Diseases, Tenth Revision, Clinical Modification, {} release",
        release
    )
}

/// Load an ICD-10-CM codex from a tabular XML file.
#[instrument(level = "debug")]
pub fn load(path: &Path, progress: bool) -> ApplicationResult<Codex> {
    let content = fs::read_to_string(path).with_path_context("read tabular XML file", path)?;
    from_xml_str(&content, path, progress)
}

/// Element of the tabular document that turns into an entry.
#[derive(Debug)]
struct Frame {
    kind: EntryKind,
    id_attr: Option<String>,
    name: Option<String>,
    desc: Option<String>,
    children: Vec<EntryId>,
}

impl Frame {
    fn new(kind: EntryKind, id_attr: Option<String>) -> Self {
        Self {
            kind,
            id_attr,
            name: None,
            desc: None,
            children: Vec::new(),
        }
    }
}

/// Field of the innermost frame currently receiving text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Desc,
}

/// Text of the top-level `<version>` element, read before any chapter.
pub fn read_version(content: &str, origin: &Path) -> ApplicationResult<String> {
    let mut reader = Reader::from_str(content);
    let mut depth = 0usize;
    let mut version: Option<String> = None;
    loop {
        match reader.read_event().map_err(|e| xml_error(origin, e))? {
            Event::Start(ref e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"version" if depth == 2 => version = Some(String::new()),
                    b"chapter" => break,
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if let Some(buf) = version.as_mut() {
                    buf.push_str(&e.unescape().map_err(|err| xml_error(origin, err))?);
                }
            }
            Event::End(ref e) => {
                if e.local_name().as_ref() == b"version" {
                    if let Some(text) = version.take() {
                        return Ok(normalize_text(&text));
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Err(ApplicationError::source_format(origin, "missing <version> element"))
}

/// Build an ICD-10-CM codex from tabular XML content; `origin` only labels errors.
pub fn from_xml_str(content: &str, origin: &Path, progress: bool) -> ApplicationResult<Codex> {
    let spinner = phase_spinner("Parsing XML", progress);
    let mut reader = Reader::from_str(content);

    let release = read_version(content, origin)?;
    debug!("tabular release {}", release);
    let mut chapters: Vec<EntryId> = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();
    // element depth of every open element, to tell direct children from nested ones
    let mut depth = 0usize;
    let mut frame_depths: Vec<usize> = Vec::new();
    let mut field: Option<(Field, String)> = None;

    let mut codex = Codex::with_revision(Revision::Rev10Cm, root_title(&release), release.as_str());

    loop {
        match reader.read_event().map_err(|e| xml_error(origin, e))? {
            Event::Start(ref e) => {
                depth += 1;
                let direct_child = frame_depths.last().is_some_and(|&d| d + 1 == depth);
                match e.local_name().as_ref() {
                    b"chapter" => {
                        frames.push(Frame::new(EntryKind::Chapter, None));
                        frame_depths.push(depth);
                    }
                    b"section" => {
                        frames.push(Frame::new(EntryKind::Block, attribute(e, b"id", origin)?));
                        frame_depths.push(depth);
                    }
                    b"diag" => {
                        frames.push(Frame::new(EntryKind::Category, None));
                        frame_depths.push(depth);
                    }
                    b"name" if direct_child => field = Some((Field::Name, String::new())),
                    b"desc" if direct_child => field = Some((Field::Desc, String::new())),
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&e.unescape().map_err(|err| xml_error(origin, err))?);
                }
            }
            Event::CData(ref e) => {
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(ref e) => {
                match e.local_name().as_ref() {
                    b"name" | b"desc" => {
                        if let Some((which, text)) = field.take() {
                            let text = normalize_text(&text);
                            match (which, frames.last_mut()) {
                                (Field::Name, Some(frame)) => frame.name = Some(text),
                                (Field::Desc, Some(frame)) => frame.desc = Some(text),
                                _ => {}
                            }
                        }
                    }
                    b"chapter" | b"section" | b"diag" => {
                        let frame = frames.pop().ok_or_else(|| {
                            ApplicationError::source_format(origin, "closing element without opening")
                        })?;
                        frame_depths.pop();
                        let id = close_frame(&mut codex, frame, origin)?;
                        match frames.last_mut() {
                            Some(parent) => parent.children.push(id),
                            None => chapters.push(id),
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    spinner.finish_and_clear();

    let root = codex.root();
    for chapter in chapters {
        codex.add_child(root, chapter)?;
    }
    info!(
        "built ICD-10-CM codex release {} with {} entries",
        release,
        codex.len(root)
    );
    Ok(codex)
}

/// Turn a closed element into an entry and attach its finished children.
fn close_frame(codex: &mut Codex, frame: Frame, origin: &Path) -> ApplicationResult<EntryId> {
    let rules = Revision::Rev10Cm.rules();
    let title = rules.format_title(frame.desc.as_deref().unwrap_or_default());
    let entry = match frame.kind {
        EntryKind::Chapter => {
            let name = frame
                .name
                .ok_or_else(|| ApplicationError::source_format(origin, "<chapter> without <name>"))?;
            Entry::chapter(&name, title)
        }
        EntryKind::Block => {
            let code = frame
                .id_attr
                .ok_or_else(|| ApplicationError::source_format(origin, "<section> without id"))?;
            Entry::new(code, title, EntryKind::Block)
        }
        kind => {
            let code = frame
                .name
                .ok_or_else(|| ApplicationError::source_format(origin, "<diag> without <name>"))?;
            Entry::new(code, title, kind)
        }
    };
    let id = codex.insert(entry)?;
    for child in frame.children {
        codex.add_child(id, child)?;
    }
    Ok(id)
}
