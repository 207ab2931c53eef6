use criterion::{criterion_group, criterion_main, Criterion};
use ernkit::{build, canonicalize, parse, BuildOptions};
use std::hint::black_box;

// Album message with `tracks` sound recordings, one release and one deal
fn album(tracks: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" xmlns:custom="http://example.com/custom" MessageSchemaVersionId="ern/43">
  <MessageHeader>
    <MessageId>BENCH-1</MessageId>
    <MessageSender><PartyId>PADPIDA2014120301A</PartyId></MessageSender>
    <MessageCreatedDateTime>2024-07-01T10:00:00Z</MessageCreatedDateTime>
  </MessageHeader>
  <ResourceList>
"#,
    );
    for i in 1..=tracks {
        xml.push_str(&format!(
            "    <SoundRecording><ResourceReference>A{i}</ResourceReference><ResourceId><ISRC>USRC1760{i:04}</ISRC></ResourceId><DisplayTitleText>Track {i}</DisplayTitleText><Duration>PT3M{}S</Duration><custom:Rating>{i}</custom:Rating></SoundRecording>\n",
            i % 60
        ));
    }
    xml.push_str("  </ResourceList>\n  <ReleaseList>\n    <Release><ReleaseReference>R1</ReleaseReference><ResourceGroup>");
    for i in 1..=tracks {
        xml.push_str(&format!(
            "<ResourceGroupContentItem><SequenceNumber>{i}</SequenceNumber><ReleaseResourceReference>A{i}</ReleaseResourceReference></ResourceGroupContentItem>"
        ));
    }
    xml.push_str("</ResourceGroup></Release>\n  </ReleaseList>\n  <DealList><ReleaseDeal><DealReleaseReference>R1</DealReleaseReference><Deal><DealTerms><TerritoryCode>Worldwide</TerritoryCode><CommercialModelType>SubscriptionModel</CommercialModelType><UseType>OnDemandStream</UseType></DealTerms></Deal></ReleaseDeal></DealList>\n</ern:NewReleaseMessage>\n");
    xml
}

fn bench_canonicalize_album(c: &mut Criterion) {
    let xml = album(20);
    c.bench_function("canonicalize_album", |b| {
        b.iter(|| {
            let _form = canonicalize(black_box(xml.as_bytes())).unwrap();
        });
    });
}

fn bench_canonicalize_large(c: &mut Criterion) {
    let xml = album(1000);
    c.bench_function("canonicalize_large", |b| {
        b.iter(|| {
            let _form = canonicalize(black_box(xml.as_bytes())).unwrap();
        });
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let xml = album(20);
    c.bench_function("round_trip", |b| {
        b.iter(|| {
            let message = parse(black_box(xml.as_bytes())).unwrap();
            let built = build(&message, &BuildOptions::default()).unwrap();
            let _form = canonicalize(&built).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_canonicalize_album,
    bench_canonicalize_large,
    bench_round_trip
);
criterion_main!(benches);
