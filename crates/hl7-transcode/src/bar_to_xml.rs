//! The schema-guided bar-to-tagged conversion path.
//!
//! The message's segment sequence is walked once against the structure
//! definition tree; matched segments become nested elements named by the
//! positional dotted convention (`PID`, `PID.3`, `PID.3.1`, `PID.3.1.2`),
//! groups become wrapper elements named after the group. This path is
//! fail-fast: a required node that cannot be matched, or a leftover
//! segment, aborts the conversion with no partial output.

use hl7_bar::BarError;
use hl7_model::{HEADER_CODE, Message, Segment, SeparatorSet, TextPart, escape};
use hl7_schema::{MessageStructure, StructureCatalog, StructureNode, TriggerTable};
use tracing::debug;

use crate::dom::{Content, Element, serialize_document};
use crate::error::{Result, TranscodeError};

const V2XML_NS: &str = "urn:hl7-org:v2xml";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Convert one bar-format message to tagged-grammar text.
pub fn bar_to_xml(raw: &str, table: &TriggerTable, catalog: &StructureCatalog) -> Result<String> {
    let (message, seps) = hl7_bar::parse_message(raw)?;
    let structure_id = resolve_structure_id(&message, table)?;
    let structure = catalog.load(&structure_id)?;
    emit_tagged(&message, &seps, &structure)
}

/// Determine the message-structure identifier from the header's
/// message-type field, consulting the trigger table when the message does
/// not carry the structure explicitly.
pub fn resolve_structure_id(message: &Message, table: &TriggerTable) -> Result<String> {
    let header = message
        .header()
        .filter(|segment| segment.code == HEADER_CODE)
        .ok_or_else(|| bar_message("message has no header segment"))?;
    let type_field = header
        .field(9)
        .filter(|field| !field.is_empty())
        .ok_or_else(|| bar_message("missing message-type field (MSH-9)"))?;
    let repetition = &type_field.repetitions[0];

    let component_text = |n: usize| {
        repetition
            .component(n)
            .and_then(|comp| comp.subcomponents.first())
            .map(String::as_str)
            .unwrap_or("")
    };
    let message_type = component_text(1);
    let trigger = component_text(2);
    let declared_structure = component_text(3);

    if message_type.is_empty() {
        return Err(bar_message("missing message code in MSH-9.1"));
    }
    if !declared_structure.is_empty() {
        return Ok(declared_structure.to_string());
    }
    // A bare ACK is the one type whose structure needs no trigger.
    if message_type == "ACK" && trigger.is_empty() {
        return Ok("ACK".to_string());
    }
    if trigger.is_empty() {
        return Err(bar_message(
            "missing trigger event (MSH-9.2) and structure (MSH-9.3)",
        ));
    }
    let structure_id = table.resolve(message_type, trigger)?;
    debug!(message_type, trigger, structure = structure_id, "resolved message structure");
    Ok(structure_id.to_string())
}

/// Serialize a message against its structure definition.
pub fn emit_tagged(
    message: &Message,
    seps: &SeparatorSet,
    structure: &MessageStructure,
) -> Result<String> {
    let matcher = Matcher {
        segments: &message.segments,
        seps,
    };
    let mut pos = 0;
    let mut content = Vec::new();
    matcher.apply(&structure.children, false, &mut pos, &mut content)?;
    if pos < message.segments.len() {
        return Err(TranscodeError::UnconsumedSegments {
            segment_index: pos,
            code: message.segments[pos].code.clone(),
        });
    }

    let mut root = Element::new(&structure.id);
    root.push_attr("xmlns", V2XML_NS);
    root.push_attr("xmlns:xsi", XSI_NS);
    root.push_attr(
        "xsi:schemaLocation",
        format!("{V2XML_NS} {}.xsd", structure.id),
    );
    root.content = content;
    serialize_document(&root)
}

fn bar_message(reason: &str) -> TranscodeError {
    TranscodeError::Bar(BarError::MalformedMessage {
        reason: reason.to_string(),
    })
}

struct Matcher<'a> {
    segments: &'a [Segment],
    seps: &'a SeparatorSet,
}

impl Matcher<'_> {
    /// Match `nodes` in document order against the segment cursor, pushing
    /// emitted elements into `out`. Returns the number of segments consumed.
    /// In choice mode the first node that consumes anything ends the pass.
    fn apply(
        &self,
        nodes: &[StructureNode],
        choice: bool,
        pos: &mut usize,
        out: &mut Vec<Content>,
    ) -> Result<usize> {
        let mut consumed = 0;
        for node in nodes {
            match node {
                StructureNode::Segment(node) => {
                    let mut occurs = 0;
                    while let Some(segment) = self.segments.get(*pos) {
                        if segment.code != node.code {
                            break;
                        }
                        out.push(Content::Child(build_segment_element(
                            segment, *pos, self.seps,
                        )?));
                        *pos += 1;
                        occurs += 1;
                        consumed += 1;
                        if !node.repeating {
                            break;
                        }
                    }
                    if occurs == 0 {
                        if choice {
                            continue;
                        }
                        if !node.optional {
                            return Err(self.mismatch(&node.code, *pos));
                        }
                    } else if choice {
                        return Ok(consumed);
                    }
                }
                StructureNode::Group(group) => {
                    let mut occurs = 0;
                    loop {
                        let mut group_pos = *pos;
                        let mut group_out = Vec::new();
                        match self.apply(&group.children, group.choice, &mut group_pos, &mut group_out)
                        {
                            Ok(n) if n > 0 => {
                                let mut element = Element::new(&group.name);
                                element.content = group_out;
                                out.push(Content::Child(element));
                                *pos = group_pos;
                                consumed += n;
                                occurs += 1;
                                if !group.repeating {
                                    break;
                                }
                            }
                            // All children skipped as optional: the group is
                            // vacuously absent here.
                            Ok(_) => break,
                            Err(err) => {
                                if group_pos == *pos {
                                    // The group does not start at this
                                    // segment at all.
                                    if occurs == 0 && !group.optional && !choice {
                                        return Err(err);
                                    }
                                    break;
                                }
                                // A later required child failed mid-group.
                                return Err(err);
                            }
                        }
                    }
                    // Choice children report their own no-match as a clean
                    // zero, so a required group that never occurred has to
                    // be caught here.
                    if occurs == 0 && !group.optional && !choice {
                        return Err(self.mismatch(&group.name, *pos));
                    }
                    if occurs > 0 && choice {
                        return Ok(consumed);
                    }
                }
            }
        }
        Ok(consumed)
    }

    fn mismatch(&self, expected: &str, pos: usize) -> TranscodeError {
        TranscodeError::StructureMismatch {
            expected: expected.to_string(),
            segment_index: pos,
            found: self
                .segments
                .get(pos)
                .map_or_else(|| "end of message".to_string(), |s| s.code.clone()),
        }
    }
}

/// Emit one segment as an element tree.
fn build_segment_element(
    segment: &Segment,
    segment_index: usize,
    seps: &SeparatorSet,
) -> Result<Element> {
    let mut element = Element::new(&segment.code);
    for (idx, field) in segment.fields.iter().enumerate() {
        let number = idx + 1;
        if field.is_empty() {
            continue;
        }
        let tag = format!("{}.{number}", segment.code);

        // The header's separator declarations are atomic text, exempt from
        // repetition splitting and escape decoding.
        if segment.code == HEADER_CODE && number <= 2 {
            let mut field_element = Element::new(tag);
            field_element.push_text(field.first_text().unwrap_or_default());
            element.push_child(field_element);
            continue;
        }

        for repetition in &field.repetitions {
            if repetition.components.iter().all(|c| c.is_empty()) {
                continue;
            }
            let mut field_element = Element::new(&tag);
            if repetition.is_atomic() {
                push_leaf(
                    &mut field_element,
                    &repetition.components[0].subcomponents[0],
                    seps,
                    segment,
                    segment_index,
                    number,
                )?;
            } else {
                for (cidx, component) in repetition.components.iter().enumerate() {
                    if component.is_empty() {
                        continue;
                    }
                    let component_tag = format!("{tag}.{}", cidx + 1);
                    let mut component_element = Element::new(&component_tag);
                    if component.subcomponents.len() == 1 {
                        push_leaf(
                            &mut component_element,
                            &component.subcomponents[0],
                            seps,
                            segment,
                            segment_index,
                            number,
                        )?;
                    } else {
                        for (sidx, subcomponent) in component.subcomponents.iter().enumerate() {
                            if subcomponent.is_empty() {
                                continue;
                            }
                            let mut sub_element =
                                Element::new(format!("{component_tag}.{}", sidx + 1));
                            push_leaf(
                                &mut sub_element,
                                subcomponent,
                                seps,
                                segment,
                                segment_index,
                                number,
                            )?;
                            component_element.push_child(sub_element);
                        }
                    }
                    field_element.push_child(component_element);
                }
            }
            element.push_child(field_element);
        }
    }
    Ok(element)
}

/// Decode raw subcomponent text into leaf content: literal text plus
/// `<escape V="..."/>` children for formatting escapes.
fn push_leaf(
    element: &mut Element,
    raw: &str,
    seps: &SeparatorSet,
    segment: &Segment,
    segment_index: usize,
    field: usize,
) -> Result<()> {
    let parts =
        escape::decode_parts(raw, seps).map_err(|source| TranscodeError::Escape {
            segment_index,
            code: segment.code.clone(),
            field,
            source,
        })?;
    for part in parts {
        match part {
            TextPart::Text(text) => {
                if !text.is_empty() {
                    element.push_text(text);
                }
            }
            TextPart::Formatting(body) => {
                let mut escape_element = Element::new("escape");
                escape_element.push_attr("V", body);
                element.push_child(escape_element);
            }
        }
    }
    Ok(())
}
