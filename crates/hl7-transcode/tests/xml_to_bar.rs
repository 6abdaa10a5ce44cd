use hl7_transcode::{TranscodeError, xml_to_bar};

const HEADER_XML: &str = "<MSH><MSH.1>|</MSH.1><MSH.2>^~\\&amp;</MSH.2><MSH.3>APP</MSH.3></MSH>";

fn doc(body: &str) -> String {
    format!("<ADT_A01 xmlns=\"urn:hl7-org:v2xml\">{HEADER_XML}{body}</ADT_A01>")
}

#[test]
fn rebuilds_separators_from_the_header() {
    let xml = "<ADT_A01><MSH><MSH.1>#</MSH.1><MSH.2>@%$*</MSH.2><MSH.3>A#B</MSH.3></MSH></ADT_A01>";
    let bar = xml_to_bar(xml).expect("serialize");
    // The '#' inside MSH.3 is a field separator now and must be escaped.
    assert_eq!(bar, "MSH#@%$*#A$F$B\r");
}

#[test]
fn gap_fills_skipped_field_positions() {
    let xml = doc("<PID><PID.1>1</PID.1><PID.5>Doe</PID.5></PID>");
    let bar = xml_to_bar(&xml).expect("serialize");
    assert_eq!(bar, "MSH|^~\\&|APP\rPID|1||||Doe\r");
}

#[test]
fn equal_positions_join_with_the_repetition_separator() {
    // Three sibling PID.3 elements are three repetitions, whatever any
    // schema would say about the field.
    let xml = doc("<PID><PID.3>a</PID.3><PID.3>b</PID.3><PID.3>c</PID.3></PID>");
    let bar = xml_to_bar(&xml).expect("serialize");
    assert_eq!(bar, "MSH|^~\\&|APP\rPID|||a~b~c\r");
}

#[test]
fn nests_components_and_subcomponents() {
    let xml = doc(
        "<PID><PID.3><PID.3.1>12345</PID.3.1><PID.3.4>\
         <PID.3.4.1>HOSP</PID.3.4.1><PID.3.4.3>ISO</PID.3.4.3>\
         </PID.3.4></PID.3></PID>",
    );
    let bar = xml_to_bar(&xml).expect("serialize");
    assert_eq!(bar, "MSH|^~\\&|APP\rPID|||12345^^^HOSP&&ISO\r");
}

#[test]
fn flattens_group_wrappers() {
    let xml = doc(
        "<ADT_A01.INSURANCE><IN1><IN1.1>1</IN1.1></IN1></ADT_A01.INSURANCE>\
         <ADT_A01.INSURANCE><IN1><IN1.1>2</IN1.1></IN1></ADT_A01.INSURANCE>",
    );
    let bar = xml_to_bar(&xml).expect("serialize");
    assert_eq!(bar, "MSH|^~\\&|APP\rIN1|1\rIN1|2\r");
}

#[test]
fn renders_escape_elements_as_delimited_bodies() {
    let xml = doc("<OBX><OBX.5>line one<escape V=\".br\"/>line two</OBX.5></OBX>");
    let bar = xml_to_bar(&xml).expect("serialize");
    assert_eq!(bar, "MSH|^~\\&|APP\rOBX|||||line one\\.br\\line two\r");
}

#[test]
fn encodes_separator_characters_in_text() {
    let xml = doc("<OBX><OBX.5>a|b^c~d\\e&amp;f</OBX.5></OBX>");
    let bar = xml_to_bar(&xml).expect("serialize");
    assert_eq!(bar, "MSH|^~\\&|APP\rOBX|||||a\\F\\b\\S\\c\\R\\d\\E\\e\\T\\f\r");
}

#[test]
fn missing_header_is_an_error() {
    let err = xml_to_bar("<ADT_A01><PID><PID.1>1</PID.1></PID></ADT_A01>").unwrap_err();
    assert!(matches!(err, TranscodeError::MalformedDocument { .. }));
}

#[test]
fn truncated_encoding_characters_are_an_error() {
    let xml = "<ACK><MSH><MSH.1>|</MSH.1><MSH.2>^~\\</MSH.2></MSH></ACK>";
    let err = xml_to_bar(xml).unwrap_err();
    assert!(matches!(err, TranscodeError::MalformedDocument { .. }));
}

#[test]
fn foreign_child_inside_a_leaf_is_an_error() {
    let xml = doc("<OBX><OBX.5>text<b>bold</b></OBX.5></OBX>");
    let err = xml_to_bar(&xml).unwrap_err();
    assert!(matches!(err, TranscodeError::MalformedDocument { .. }));
}
