//! Parse, build and canonicalize round trips over the shared fixtures

#[path = "fixtures/mod.rs"]
mod fixtures;

use ernkit::{
    build, canonicalize, parse, parse_with_options, BuildOptions, NamespaceStrategy, ParseOptions,
    SchemaVersion,
};
use pretty_assertions::assert_eq;

#[test]
fn canonical_round_trip() {
    for (name, xml) in fixtures::all() {
        let message = parse(xml.as_bytes()).unwrap_or_else(|e| panic!("{name}: {e}"));
        let built = build(&message, &BuildOptions::default()).unwrap_or_else(|e| panic!("{name}: {e}"));
        let expected = canonicalize(xml.as_bytes()).unwrap();
        let actual = canonicalize(&built).unwrap();
        assert_eq!(actual.as_str(), expected.as_str(), "{name}");
        assert_eq!(actual.digest_hex(), expected.digest_hex(), "{name}");
    }
}

#[test]
fn builder_output_is_already_canonical() {
    for (name, xml) in fixtures::all() {
        let built = build(&parse(xml.as_bytes()).unwrap(), &BuildOptions::default()).unwrap();
        assert_eq!(
            String::from_utf8(built.clone()).unwrap(),
            canonicalize(&built).unwrap().as_str(),
            "{name}"
        );
    }
}

#[test]
fn canonicalize_is_idempotent() {
    for (name, xml) in fixtures::all() {
        let once = canonicalize(xml.as_bytes()).unwrap();
        let twice = canonicalize(once.as_bytes()).unwrap();
        assert_eq!(once, twice, "{name}");
    }
}

#[test]
fn versions_are_detected() {
    let versions: Vec<SchemaVersion> = fixtures::all()
        .into_iter()
        .map(|(_, xml)| parse(xml.as_bytes()).unwrap().version())
        .collect();
    assert_eq!(
        versions,
        vec![SchemaVersion::Ern43, SchemaVersion::Ern382, SchemaVersion::Ern42]
    );
}

#[test]
fn identifiers_titles_and_durations_survive() {
    let values = [
        "USRC17607839",
        "USRC17607840",
        "0123456789012",
        "First Light &amp; Shadow",
        "Second Wind",
        "Example Album",
        "The Example Band",
        "Jane Writer",
        "PT3M45S",
        "PT4M2.5S",
        "GBAYE0601498",
        "5012345678900",
        "Night Drive",
        "DJ Example",
        "PT5M1S",
    ];
    let built: String = [fixtures::ERN43_ALBUM, fixtures::ERN382_SINGLE]
        .iter()
        .map(|xml| {
            let message = parse(xml.as_bytes()).unwrap();
            String::from_utf8(build(&message, &BuildOptions::default()).unwrap()).unwrap()
        })
        .collect();
    for value in values {
        assert!(built.contains(value), "{value} missing from output");
    }
}

#[test]
fn every_extension_reappears() {
    for (name, xml) in fixtures::all() {
        let message = parse(xml.as_bytes()).unwrap();
        let rebuilt = parse(&build(&message, &BuildOptions::default()).unwrap()).unwrap();
        assert_eq!(message.extensions.len(), rebuilt.extensions.len(), "{name}");
        for (before, after) in message.extensions.iter().zip(&rebuilt.extensions) {
            assert_eq!(before.namespace_uri, after.namespace_uri, "{name}");
            assert_eq!(before.local_name, after.local_name, "{name}");
            assert_eq!(before.value(), after.value(), "{name}");
            assert_eq!(before.anchor, after.anchor, "{name}");
        }
    }
}

#[test]
fn extension_inventory() {
    let message = parse(fixtures::ERN43_ALBUM.as_bytes()).unwrap();
    let names: Vec<(&str, &str)> = message
        .extensions
        .iter()
        .map(|block| (block.local_name.as_str(), block.anchor.parent_path.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("batch", "/NewReleaseMessage"),
            (
                "QualityRating",
                "/NewReleaseMessage/ResourceList[1]/SoundRecording[1]"
            ),
            (
                "variant",
                "/NewReleaseMessage/ResourceList[1]/Image[1]/Type[1]"
            ),
        ]
    );
}

#[test]
fn built_output_is_deterministic() {
    for (name, xml) in fixtures::all() {
        let message = parse(xml.as_bytes()).unwrap();
        let first = build(&message, &BuildOptions::default()).unwrap();
        for _ in 0..5 {
            assert_eq!(first, build(&message, &BuildOptions::default()).unwrap(), "{name}");
        }
        let options = BuildOptions::default().with_determinism_check(10);
        assert_eq!(first, build(&message, &options).unwrap(), "{name}");
    }
}

#[test]
fn inherit_strategy_keeps_source_prefixes() {
    let message = parse(fixtures::ERN43_ALBUM.as_bytes()).unwrap();
    let options = BuildOptions::default().with_namespace_strategy(NamespaceStrategy::Inherit);
    let built = String::from_utf8(build(&message, &options).unwrap()).unwrap();
    assert!(built.contains("<custom:QualityRating>Hi-Res</custom:QualityRating>"));
    assert!(built.contains(r#"spotify:batch="2024-07""#));
    // prefixes differ, the canonical form does not
    assert_eq!(
        canonicalize(built.as_bytes()).unwrap(),
        canonicalize(fixtures::ERN43_ALBUM.as_bytes()).unwrap()
    );
}

#[test]
fn model_edits_show_up_in_output() {
    let mut message = parse(fixtures::ERN43_ALBUM.as_bytes()).unwrap();
    message.resources[1].set_title("Second Wind (Remastered)");
    let built = String::from_utf8(build(&message, &BuildOptions::default()).unwrap()).unwrap();
    assert!(built.contains("<DisplayTitleText>Second Wind (Remastered)</DisplayTitleText>"));
    assert_ne!(
        canonicalize(built.as_bytes()).unwrap(),
        canonicalize(fixtures::ERN43_ALBUM.as_bytes()).unwrap()
    );
}

#[test]
fn list_attributes_survive() {
    let xml = r#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" MessageSchemaVersionId="ern/43">
  <MessageHeader>
    <MessageId>MSG-1</MessageId>
    <MessageSender><PartyId>PADPIDA2014120301A</PartyId></MessageSender>
    <MessageCreatedDateTime>2024-01-01T00:00:00Z</MessageCreatedDateTime>
  </MessageHeader>
  <ResourceList LanguageAndScriptCode="en"/>
  <ReleaseList/>
  <DealList xsi:nil="false"/>
</ern:NewReleaseMessage>"#;
    let expected = canonicalize(xml.as_bytes()).unwrap();
    assert!(expected.as_str().contains(r#"<ResourceList LanguageAndScriptCode="en"/>"#));
    assert!(expected.as_str().contains(r#"<DealList xsi:nil="false"/>"#));

    for options in [
        ParseOptions::default(),
        ParseOptions::default().with_streaming(true),
    ] {
        let message = parse_with_options(xml.as_bytes(), &options).unwrap();
        assert_eq!(
            message.root().list_attributes["ResourceList"][0].value,
            "en"
        );
        let built = build(&message, &BuildOptions::default()).unwrap();
        assert_eq!(canonicalize(&built).unwrap().as_str(), expected.as_str());
    }
}
