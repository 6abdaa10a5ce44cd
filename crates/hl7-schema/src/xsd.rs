//! Loading message-structure definitions from v2.xml XML Schema files.
//!
//! A structure file defines one `<id>.CONTENT` complex type whose sequence
//! (or choice) lists segment refs and group refs; each group has its own
//! `.CONTENT` type in the same file. Refs of three characters are segments,
//! longer refs are groups.

use std::collections::BTreeMap;
use std::path::PathBuf;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::structure::{GroupNode, MessageStructure, SegmentNode, StructureNode};

const MAX_GROUP_DEPTH: usize = 64;

/// Loads structure definitions from a schema directory on demand.
///
/// The directory layout follows the v2.xml distribution: `<dir>/xsd/<id>.xsd`
/// per message structure.
#[derive(Debug, Clone)]
pub struct StructureCatalog {
    dir: PathBuf,
}

impl StructureCatalog {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        StructureCatalog {
            dir: schema_dir.into(),
        }
    }

    /// Load the definition for one structure identifier.
    pub fn load(&self, id: &str) -> Result<MessageStructure> {
        let path = self.dir.join("xsd").join(format!("{id}.xsd"));
        let text = std::fs::read_to_string(&path).map_err(|source| SchemaError::FileRead {
            path: path.clone(),
            source,
        })?;
        debug!(structure = id, path = %path.display(), "loading structure definition");
        parse_structure(&text, id)
    }
}

#[derive(Debug, Default)]
struct ContentDef {
    choice: bool,
    elements: Vec<ElementRef>,
}

#[derive(Debug)]
struct ElementRef {
    target: String,
    optional: bool,
    repeating: bool,
}

/// Parse one structure definition out of schema XML text.
pub fn parse_structure(xml: &str, id: &str) -> Result<MessageStructure> {
    let contents = collect_content_defs(xml)?;
    let root = contents
        .get(&format!("{id}.CONTENT"))
        .ok_or_else(|| SchemaError::MissingContent {
            name: format!("{id}.CONTENT"),
        })?;
    let children = build_nodes(&contents, root, 0)?;
    Ok(MessageStructure {
        id: id.to_string(),
        children,
    })
}

fn build_nodes(
    contents: &BTreeMap<String, ContentDef>,
    def: &ContentDef,
    depth: usize,
) -> Result<Vec<StructureNode>> {
    let mut nodes = Vec::with_capacity(def.elements.len());
    for element in &def.elements {
        // Three-character refs are segments; anything longer is a group.
        if element.target.len() == 3 {
            nodes.push(StructureNode::Segment(SegmentNode {
                code: element.target.clone(),
                optional: element.optional,
                repeating: element.repeating,
            }));
            continue;
        }
        let content_name = format!("{}.CONTENT", element.target);
        let group_def = contents.get(&content_name);
        let (Some(group_def), true) = (group_def, depth < MAX_GROUP_DEPTH) else {
            return Err(SchemaError::MissingContent { name: content_name });
        };
        nodes.push(StructureNode::Group(GroupNode {
            name: element.target.clone(),
            optional: element.optional,
            repeating: element.repeating,
            choice: group_def.choice,
            children: build_nodes(contents, group_def, depth + 1)?,
        }));
    }
    Ok(nodes)
}

fn collect_content_defs(xml: &str) -> Result<BTreeMap<String, ContentDef>> {
    let mut reader = Reader::from_str(xml);
    let mut contents: BTreeMap<String, ContentDef> = BTreeMap::new();
    let mut current: Option<(String, ContentDef)> = None;
    let mut in_list = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().local_name().as_ref() {
                b"complexType" => {
                    if let Some(name) = attribute(&e, b"name")? {
                        if name.ends_with(".CONTENT") {
                            current = Some((name, ContentDef::default()));
                        }
                    }
                }
                b"sequence" => {
                    if current.is_some() {
                        in_list = true;
                    }
                }
                b"choice" => {
                    if let Some((_, def)) = current.as_mut() {
                        def.choice = true;
                        in_list = true;
                    }
                }
                b"element" => {
                    push_element_ref(&e, current.as_mut(), in_list)?;
                }
                _ => {}
            },
            Event::Empty(e) => {
                if e.name().local_name().as_ref() == b"element" {
                    push_element_ref(&e, current.as_mut(), in_list)?;
                }
            }
            Event::End(e) => match e.name().local_name().as_ref() {
                b"complexType" => {
                    if let Some((name, def)) = current.take() {
                        contents.insert(name, def);
                    }
                }
                b"sequence" | b"choice" => in_list = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(contents)
}

fn push_element_ref(
    e: &BytesStart<'_>,
    current: Option<&mut (String, ContentDef)>,
    in_list: bool,
) -> Result<()> {
    let Some((_, def)) = current else {
        return Ok(());
    };
    if !in_list {
        return Ok(());
    }
    let Some(target) = attribute(e, b"ref")? else {
        return Ok(());
    };
    let min = attribute(e, b"minOccurs")?.unwrap_or_else(|| "1".to_string());
    let max = attribute(e, b"maxOccurs")?.unwrap_or_else(|| "1".to_string());
    let repeating = max == "unbounded" || max.parse::<u32>().map(|n| n > 1).unwrap_or(false);
    def.elements.push(ElementRef {
        target,
        optional: min == "0",
        repeating,
    });
    Ok(())
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(String::from_utf8_lossy(attr.value.as_ref()).into_owned()));
        }
    }
    Ok(None)
}
