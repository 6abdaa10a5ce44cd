use hl7_bar::parse_message;
use hl7_schema::{GroupNode, MessageStructure, StructureNode, TriggerTable};
use hl7_transcode::{TranscodeError, emit_tagged, resolve_structure_id};

const MSH: &str = "MSH|^~\\&|SEND|SFAC|RECV|RFAC|20240102030405||ADT^A01|MSG00001|P|2.4";

fn adt_a01() -> MessageStructure {
    MessageStructure {
        id: "ADT_A01".to_string(),
        children: vec![
            StructureNode::segment("MSH"),
            StructureNode::segment("EVN"),
            StructureNode::segment("PID"),
            StructureNode::segment("NK1")
                .with_optional(true)
                .with_repeating(true),
            StructureNode::Group(GroupNode {
                name: "ADT_A01.INSURANCE".to_string(),
                optional: true,
                repeating: true,
                choice: false,
                children: vec![
                    StructureNode::segment("IN1"),
                    StructureNode::segment("IN2").with_optional(true),
                ],
            }),
        ],
    }
}

fn ack() -> MessageStructure {
    MessageStructure {
        id: "ACK".to_string(),
        children: vec![
            StructureNode::segment("MSH"),
            StructureNode::segment("MSA"),
            StructureNode::segment("ERR").with_optional(true),
        ],
    }
}

#[test]
fn emits_ack_message() {
    let raw = "MSH|^~\\&|A|B|C|D|20240101||ACK|1|P|2.4\rMSA|AA|1";
    let (message, seps) = parse_message(raw).expect("parse");
    let xml = emit_tagged(&message, &seps, &ack()).expect("emit");
    insta::assert_snapshot!(xml, @r#"
<?xml version="1.0" encoding="UTF-8"?>
<ACK xmlns="urn:hl7-org:v2xml" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="urn:hl7-org:v2xml ACK.xsd">
  <MSH>
    <MSH.1>|</MSH.1>
    <MSH.2>^~\&amp;</MSH.2>
    <MSH.3>A</MSH.3>
    <MSH.4>B</MSH.4>
    <MSH.5>C</MSH.5>
    <MSH.6>D</MSH.6>
    <MSH.7>20240101</MSH.7>
    <MSH.9>ACK</MSH.9>
    <MSH.10>1</MSH.10>
    <MSH.11>P</MSH.11>
    <MSH.12>2.4</MSH.12>
  </MSH>
  <MSA>
    <MSA.1>AA</MSA.1>
    <MSA.2>1</MSA.2>
  </MSA>
</ACK>
"#);
}

#[test]
fn groups_and_repetitions_nest() {
    let raw = format!(
        "{MSH}\rEVN|A01\rPID|1||12345^^^HOSP&1.2.3&ISO~67890||Doe^John\r\
         NK1|1|Doe^Jane|SPO\rNK1|2|Doe^Jim|FTH\rIN1|1|PLAN001\rIN2|1|X\rIN1|2|PLAN002"
    );
    let (message, seps) = parse_message(&raw).expect("parse");
    let xml = emit_tagged(&message, &seps, &adt_a01()).expect("emit");
    let doc = hl7_transcode::dom::parse_document(&xml).expect("reparse");

    let tags: Vec<&str> = doc.children().map(|c| c.tag.as_str()).collect();
    assert_eq!(
        tags,
        vec![
            "MSH",
            "EVN",
            "PID",
            "NK1",
            "NK1",
            "ADT_A01.INSURANCE",
            "ADT_A01.INSURANCE"
        ]
    );

    let first_group = doc
        .children()
        .find(|c| c.tag == "ADT_A01.INSURANCE")
        .expect("group");
    let group_tags: Vec<&str> = first_group.children().map(|c| c.tag.as_str()).collect();
    assert_eq!(group_tags, vec!["IN1", "IN2"]);

    // Two repetitions of PID-3 become sibling field elements; the first is
    // component-structured, the second atomic.
    let pid = doc.children().find(|c| c.tag == "PID").expect("PID");
    let reps: Vec<&hl7_transcode::dom::Element> =
        pid.children().filter(|c| c.tag == "PID.3").collect();
    assert_eq!(reps.len(), 2);
    let sub_tags: Vec<&str> = reps[0].children().map(|c| c.tag.as_str()).collect();
    assert_eq!(sub_tags, vec!["PID.3.1", "PID.3.4"]);
    let assigning = reps[0]
        .children()
        .find(|c| c.tag == "PID.3.4")
        .expect("PID.3.4");
    let sub_sub: Vec<String> = assigning.children().map(|c| c.text()).collect();
    assert_eq!(sub_sub, vec!["HOSP", "1.2.3", "ISO"]);
    assert_eq!(reps[1].text(), "67890");
}

#[test]
fn decodes_escapes_into_leaf_text() {
    let raw = format!("{MSH}\rEVN|A01\rPID|1||ID||Doe\\S\\Smith^Pipe\\F\\Name");
    let (message, seps) = parse_message(&raw).expect("parse");
    let xml = emit_tagged(&message, &seps, &adt_a01()).expect("emit");
    assert!(xml.contains("<PID.5.1>Doe^Smith</PID.5.1>"));
    assert!(xml.contains("<PID.5.2>Pipe|Name</PID.5.2>"));
}

#[test]
fn formatting_escapes_become_escape_elements() {
    let raw = format!("{MSH}\rEVN|A01\rPID|1||ID||line one\\.br\\line two");
    let (message, seps) = parse_message(&raw).expect("parse");
    let xml = emit_tagged(&message, &seps, &adt_a01()).expect("emit");
    assert!(xml.contains("<PID.5>line one<escape V=\".br\"/>line two</PID.5>"));
}

#[test]
fn unexpected_segment_is_a_structure_mismatch() {
    let raw = format!("{MSH}\rZZZ|custom\rEVN|A01\rPID|1");
    let (message, seps) = parse_message(&raw).expect("parse");
    let err = emit_tagged(&message, &seps, &adt_a01()).unwrap_err();
    match err {
        TranscodeError::StructureMismatch {
            expected,
            segment_index,
            found,
        } => {
            assert_eq!(expected, "EVN");
            assert_eq!(segment_index, 1);
            assert_eq!(found, "ZZZ");
        }
        other => panic!("expected StructureMismatch, got {other}"),
    }
}

#[test]
fn leftover_segment_is_an_error() {
    let raw = format!("{MSH}\rEVN|A01\rPID|1\rZZZ|extra");
    let (message, seps) = parse_message(&raw).expect("parse");
    let err = emit_tagged(&message, &seps, &adt_a01()).unwrap_err();
    assert!(matches!(
        err,
        TranscodeError::UnconsumedSegments {
            segment_index: 3,
            ..
        }
    ));
}

#[test]
fn missing_required_segment_fails_at_end_of_message() {
    let raw = format!("{MSH}\rEVN|A01");
    let (message, seps) = parse_message(&raw).expect("parse");
    let err = emit_tagged(&message, &seps, &adt_a01()).unwrap_err();
    match err {
        TranscodeError::StructureMismatch { expected, found, .. } => {
            assert_eq!(expected, "PID");
            assert_eq!(found, "end of message");
        }
        other => panic!("expected StructureMismatch, got {other}"),
    }
}

#[test]
fn required_choice_group_with_no_match_is_a_mismatch() {
    let structure = MessageStructure {
        id: "ORM_O01".to_string(),
        children: vec![
            StructureNode::segment("MSH"),
            StructureNode::Group(GroupNode {
                name: "ORM_O01.CHOICE".to_string(),
                optional: false,
                repeating: false,
                choice: true,
                children: vec![StructureNode::segment("OBR"), StructureNode::segment("RQD")],
            }),
        ],
    };
    let raw = "MSH|^~\\&|A|B|C|D|20240101||ORM^O01|1|P|2.4";
    let (message, seps) = parse_message(raw).expect("parse");
    let err = emit_tagged(&message, &seps, &structure).unwrap_err();
    match err {
        TranscodeError::StructureMismatch { expected, found, .. } => {
            assert_eq!(expected, "ORM_O01.CHOICE");
            assert_eq!(found, "end of message");
        }
        other => panic!("expected StructureMismatch, got {other}"),
    }

    // Same structure against a segment no choice child accepts.
    let raw = format!("{raw}\rZZZ|x");
    let (message, seps) = parse_message(&raw).expect("parse");
    let err = emit_tagged(&message, &seps, &structure).unwrap_err();
    match err {
        TranscodeError::StructureMismatch { expected, found, .. } => {
            assert_eq!(expected, "ORM_O01.CHOICE");
            assert_eq!(found, "ZZZ");
        }
        other => panic!("expected StructureMismatch, got {other}"),
    }
}

#[test]
fn structure_id_comes_from_the_trigger_table() {
    let table = TriggerTable::from_entries([("ADT_A01", "A01,A04,A08,A13"), ("ADT_A02", "A02")])
        .expect("table");
    let (message, _) = parse_message(MSH).expect("parse");
    assert_eq!(
        resolve_structure_id(&message, &table).expect("resolve"),
        "ADT_A01"
    );
}

#[test]
fn declared_structure_wins_over_the_table() {
    let raw = MSH.replace("ADT^A01", "ADT^A01^ADT_A05");
    let table = TriggerTable::from_entries([("ADT_A01", "A01")]).expect("table");
    let (message, _) = parse_message(&raw).expect("parse");
    assert_eq!(
        resolve_structure_id(&message, &table).expect("resolve"),
        "ADT_A05"
    );
}

#[test]
fn bare_ack_resolves_without_the_table() {
    let raw = "MSH|^~\\&|A|B|C|D|20240101||ACK|1|P|2.4";
    let table = TriggerTable::from_entries([]).expect("table");
    let (message, _) = parse_message(raw).expect("parse");
    assert_eq!(
        resolve_structure_id(&message, &table).expect("resolve"),
        "ACK"
    );
}

#[test]
fn ambiguous_trigger_surfaces_as_unknown_structure() {
    let table = TriggerTable::from_entries([("ADT_A01", "A01"), ("ADT_A09", "A01,A09")])
        .expect("table");
    let (message, _) = parse_message(MSH).expect("parse");
    let err = resolve_structure_id(&message, &table).unwrap_err();
    assert!(matches!(
        err,
        TranscodeError::Schema(hl7_schema::SchemaError::UnknownStructure { matches: 2, .. })
    ));
}
