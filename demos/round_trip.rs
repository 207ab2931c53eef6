// This application reads an ERN message from the file named on the command
// line (or uses a small built-in message), parses it, builds it back and
// checks that the rebuilt XML has the same canonical digest as the input.
// It then prints the flattened view of the message as JSON.

use std::env;
use std::error::Error;
use std::fs;

use ernkit::{build, canonicalize, parse, BuildOptions};

const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" xmlns:label="urn:example:label" MessageSchemaVersionId="ern/43">
  <MessageHeader>
    <MessageId>DEMO-1</MessageId>
    <MessageSender>
      <PartyId>PADPIDA2014120301A</PartyId>
      <PartyName><FullName>Demo Records</FullName></PartyName>
    </MessageSender>
    <MessageCreatedDateTime>2024-07-01T10:00:00Z</MessageCreatedDateTime>
  </MessageHeader>
  <ResourceList>
    <SoundRecording>
      <ResourceReference>A1</ResourceReference>
      <ResourceId><ISRC>USRC17607839</ISRC></ResourceId>
      <DisplayTitleText>Demo Track</DisplayTitleText>
      <Duration>PT3M30S</Duration>
      <label:Mood>bright</label:Mood>
    </SoundRecording>
  </ResourceList>
  <ReleaseList>
    <Release>
      <ReleaseReference>R1</ReleaseReference>
      <ReleaseId><ICPN>0123456789012</ICPN></ReleaseId>
      <DisplayTitleText>Demo Single</DisplayTitleText>
      <ResourceGroup>
        <ResourceGroupContentItem>
          <ReleaseResourceReference>A1</ReleaseResourceReference>
        </ResourceGroupContentItem>
      </ResourceGroup>
    </Release>
  </ReleaseList>
</ern:NewReleaseMessage>
"#;

fn round_trip() -> Result<(), Box<dyn Error>> {
    // At most one argument: a path to a message file.
    let args: Vec<String> = env::args().collect();
    let input = match args.len() {
        1 => SAMPLE.as_bytes().to_vec(),
        2 => fs::read(&args[1])?,
        n => {
            eprintln!("expected at most 1 argument (file name), got {} arguments", n - 1);
            std::process::exit(1);
        }
    };

    let message = parse(&input)?;
    println!(
        "ERN {} with {} resources, {} releases, {} extensions",
        message.version(),
        message.resources.len(),
        message.releases.len(),
        message.extensions.len()
    );
    for warning in message.warnings() {
        println!("warning: {}", warning);
    }

    let built = build(&message, &BuildOptions::default())?;
    let source = canonicalize(&input)?;
    let rebuilt = canonicalize(&built)?;
    println!("source  sha256 {}", source.digest_hex());
    println!("rebuilt sha256 {}", rebuilt.digest_hex());
    if source != rebuilt {
        return Err("rebuilt message differs from its source".into());
    }

    println!("{}", message.flatten().to_json()?);

    Ok(())
}

fn main() {
    if let Err(err) = round_trip() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
