mod common;

use std::cell::RefCell;
use std::io::{Cursor, Read, Seek, SeekFrom};

use common::*;
use mat_reader::{
    DataElement, ElementDecoder, Endian, Level5Decoder, MatError, NumericData, RawElementReader,
    Result, SubsystemData, SubsystemParser,
};

const LE: Endian = Endian::Little;

/// Positions a cursor over a file image just past its header.
fn body_cursor(bytes: &[u8]) -> Cursor<&[u8]> {
    let mut cursor = Cursor::new(bytes);
    cursor.seek(SeekFrom::Start(128)).unwrap();
    cursor
}

fn sample_elements() -> Vec<Vec<u8>> {
    vec![
        double_matrix(LE, "x", &[1, 3], &[1.0, 2.0, 3.0]),
        char_matrix(LE, "label", "hello"),
        struct_matrix(LE, "s", &[1, 1], &["a"], &[scalar(LE, 5.0)]),
        compressed(LE, &double_matrix(LE, "z", &[1, 1], &[7.0])),
    ]
}

#[test]
fn reads_every_element_in_order_without_subsystem() {
    let elements = sample_elements();
    let bytes = mat_file(LE, &elements, None);

    let reader = RawElementReader::level5(LE);
    let (variables, subsystem) = reader
        .read_all(&mut body_cursor(&bytes), None)
        .expect("read ok");

    assert_eq!(variables.len(), elements.len());
    assert!(subsystem.is_empty());

    let offsets: Vec<u64> = variables.iter().map(|v| v.offset).collect();
    assert_eq!(offsets, element_offsets(&elements));
    for win in offsets.windows(2) {
        assert!(win[0] < win[1], "offsets not strictly increasing: {:?}", offsets);
    }

    let names: Vec<&str> = variables
        .iter()
        .map(|v| v.element.as_matrix().expect("matrix").name.as_str())
        .collect();
    assert_eq!(names, ["x", "label", "s", "z"]);
}

#[test]
fn subsystem_element_is_consumed_and_parsed() {
    let mut elements = sample_elements();
    let payload = subsystem_payload(LE);
    elements.insert(2, uint8_matrix(LE, "", &payload));
    let bytes = mat_file(LE, &elements, Some(2));
    let subsystem_offset = element_offsets(&elements)[2];

    let reader = RawElementReader::level5(LE);
    let (variables, subsystem) = reader
        .read_all(&mut body_cursor(&bytes), Some(subsystem_offset))
        .expect("read ok");

    assert_eq!(variables.len(), elements.len() - 1);
    assert!(variables.iter().all(|v| v.offset != subsystem_offset));

    let expected = Level5Decoder::new(LE)
        .parse_subsystem(&payload, &SubsystemData::default())
        .expect("parse payload");
    assert_eq!(subsystem, expected);
    assert_eq!(subsystem.class_names(), ["Widget", "shapes.Gadget"]);
    assert_eq!(subsystem.strings(), ["Widget", "Gadget", "shapes"]);
    assert_eq!(subsystem.elements().len(), 1);
}

#[test]
fn repeated_reads_are_identical() {
    let mut elements = sample_elements();
    elements.push(uint8_matrix(LE, "", &subsystem_payload(LE)));
    let index = elements.len() - 1;
    let offset = element_offsets(&elements)[index];
    let first_copy = mat_file(LE, &elements, Some(index));
    let second_copy = first_copy.clone();

    let reader = RawElementReader::level5(LE);
    let first = reader.read_all(&mut body_cursor(&first_copy), Some(offset)).unwrap();
    let second = reader.read_all(&mut body_cursor(&second_copy), Some(offset)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_stream_yields_nothing() {
    let bytes = mat_file(LE, &[], None);
    let (variables, subsystem) = RawElementReader::level5(LE)
        .read_all(&mut body_cursor(&bytes), None)
        .unwrap();
    assert!(variables.is_empty());
    assert!(subsystem.is_empty());
}

#[test]
fn truncated_element_is_fatal() {
    let elements = sample_elements();
    let mut bytes = mat_file(LE, &elements, None);
    bytes.truncate(bytes.len() - 3);

    let result = RawElementReader::level5(LE).read_all(&mut body_cursor(&bytes), None);
    assert!(
        matches!(result, Err(MatError::MalformedElement(_))),
        "expected MalformedElement, got {:?}",
        result
    );
}

#[test]
fn truncated_tag_is_fatal() {
    let mut bytes = mat_file(LE, &[scalar(LE, 1.0)], None);
    bytes.extend_from_slice(&[14, 0, 0]);

    let result = RawElementReader::level5(LE).read_all(&mut body_cursor(&bytes), None);
    assert!(matches!(result, Err(MatError::MalformedElement(_))));
}

#[test]
fn unknown_data_type_is_fatal() {
    let mut bytes = mat_file(LE, &[], None);
    bytes.extend(element(LE, 8, &[0; 8]));

    let result = RawElementReader::level5(LE).read_all(&mut body_cursor(&bytes), None);
    assert!(matches!(result, Err(MatError::MalformedElement(_))));
}

#[test]
fn non_byte_element_at_subsystem_offset_is_fatal() {
    let elements = vec![scalar(LE, 1.0), double_matrix(LE, "d", &[1, 2], &[1.0, 2.0])];
    let bytes = mat_file(LE, &elements, Some(1));
    let offset = element_offsets(&elements)[1];

    let result = RawElementReader::level5(LE).read_all(&mut body_cursor(&bytes), Some(offset));
    assert!(matches!(result, Err(MatError::MalformedElement(_))));
}

#[test]
fn bare_byte_element_carries_subsystem_payload() {
    let payload = subsystem_payload(LE);
    let elements = vec![scalar(LE, 1.0), element(LE, MI_UINT8, &payload)];
    let bytes = mat_file(LE, &elements, Some(1));
    let offset = element_offsets(&elements)[1];

    let (variables, subsystem) = RawElementReader::level5(LE)
        .read_all(&mut body_cursor(&bytes), Some(offset))
        .unwrap();
    assert_eq!(variables.len(), 1);
    assert_eq!(subsystem.class_names(), ["Widget", "shapes.Gadget"]);
}

/// Treats every byte of the stream as one element and records, per decode,
/// whether subsystem data was already known.
#[derive(Default)]
struct ByteDecoder {
    saw_subsystem: RefCell<Vec<bool>>,
}

impl ElementDecoder for ByteDecoder {
    fn read_element<R: Read + Seek>(
        &self,
        reader: &mut R,
        subsystem: &SubsystemData,
    ) -> Result<DataElement> {
        let mut byte = [0u8; 1];
        if reader.read(&mut byte)? == 0 {
            return Err(MatError::EndOfStream);
        }
        if byte[0] == 0xFF {
            return Err(MatError::MalformedElement("poison byte".to_string()));
        }
        self.saw_subsystem.borrow_mut().push(!subsystem.is_empty());
        Ok(DataElement::Numeric(NumericData::UInt8(vec![byte[0]])))
    }
}

/// Wraps the payload as text, counting how many times it was called.
#[derive(Default)]
struct TextParser {
    calls: RefCell<Vec<(Vec<u8>, bool)>>,
}

impl SubsystemParser for TextParser {
    fn parse_subsystem(&self, bytes: &[u8], previous: &SubsystemData) -> Result<SubsystemData> {
        self.calls.borrow_mut().push((bytes.to_vec(), previous.is_empty()));
        Ok(SubsystemData::new(
            vec![DataElement::Text(format!("payload {:?}", bytes))],
            Vec::new(),
            Vec::new(),
        ))
    }
}

#[test]
fn later_elements_see_subsystem_data_and_earlier_ones_do_not() {
    let decoder = ByteDecoder::default();
    let parser = TextParser::default();
    let reader = RawElementReader::new(&decoder, &parser);

    let mut stream = Cursor::new(vec![10u8, 11, 42, 12, 13]);
    let (variables, subsystem) = reader.read_all(&mut stream, Some(2)).unwrap();

    let offsets: Vec<u64> = variables.iter().map(|v| v.offset).collect();
    assert_eq!(offsets, [0, 1, 3, 4]);
    assert_eq!(
        subsystem.elements(),
        [DataElement::Text("payload [42]".to_string())]
    );
    assert_eq!(*parser.calls.borrow(), [(vec![42u8], true)]);
    assert_eq!(*decoder.saw_subsystem.borrow(), [false, false, false, true, true]);
}

#[test]
fn parser_is_not_called_without_a_match() {
    let decoder = ByteDecoder::default();
    let parser = TextParser::default();
    let reader = RawElementReader::new(&decoder, &parser);

    let mut stream = Cursor::new(vec![1u8, 2, 3]);
    let (variables, subsystem) = reader.read_all(&mut stream, Some(100)).unwrap();
    assert_eq!(variables.len(), 3);
    assert!(subsystem.is_empty());
    assert!(parser.calls.borrow().is_empty());
}

#[test]
fn decode_errors_abort_the_pass() {
    let decoder = ByteDecoder::default();
    let parser = TextParser::default();
    let reader = RawElementReader::new(&decoder, &parser);

    let mut stream = Cursor::new(vec![1u8, 2, 0xFF, 3]);
    let result = reader.read_all(&mut stream, None);
    assert!(matches!(result, Err(MatError::MalformedElement(msg)) if msg == "poison byte"));
}

#[test]
fn oversized_declared_payload_is_truncation_not_allocation() {
    let mut bytes = mat_file(LE, &[], None);
    bytes.extend_from_slice(&9u32.to_le_bytes());
    bytes.extend_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
    bytes.extend_from_slice(&[0; 8]);

    let result = RawElementReader::level5(LE).read_all(&mut body_cursor(&bytes), None);
    match result {
        Err(MatError::MalformedElement(message)) => {
            assert!(message.contains("found 8"), "message was {:?}", message)
        }
        other => panic!("expected MalformedElement, got {:?}", other),
    }
}
