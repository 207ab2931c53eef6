//! Shared ERN messages for the integration tests
#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

/// ERN 4.3 album: parties, two tracks and an image, a track release, deals
/// out of canonical order, extensions on an element, an attribute and the root
pub const ERN43_ALBUM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" xmlns:custom="http://example.com/custom" xmlns:spotify="http://spotify.com/ddex/ext" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" LanguageAndScriptCode="en" MessageSchemaVersionId="ern/43" xsi:schemaLocation="http://ddex.net/xml/ern/43 http://ddex.net/xml/ern/43/release-notification.xsd" spotify:batch="2024-07">
  <MessageHeader>
    <MessageThreadId>THREAD-1</MessageThreadId>
    <MessageId>MSG-43-0001</MessageId>
    <MessageSender>
      <PartyId>PADPIDA2014120301A</PartyId>
      <PartyName><FullName>Example Records</FullName></PartyName>
    </MessageSender>
    <MessageRecipient>
      <PartyId>PADPIDA2015010101B</PartyId>
      <PartyName><FullName>Example Store</FullName></PartyName>
    </MessageRecipient>
    <MessageCreatedDateTime>2024-07-01T10:00:00Z</MessageCreatedDateTime>
    <MessageControlType>LiveMessage</MessageControlType>
  </MessageHeader>
  <PartyList>
    <Party>
      <PartyReference>P1</PartyReference>
      <PartyName><FullName>The Example Band</FullName></PartyName>
    </Party>
    <Party>
      <PartyReference>P2</PartyReference>
      <PartyId><ISNI>0000000121032683</ISNI></PartyId>
      <PartyName><FullName>Jane Writer</FullName></PartyName>
    </Party>
  </PartyList>
  <ResourceList>
    <SoundRecording>
      <ResourceReference>A1</ResourceReference>
      <Type>MusicalWorkSoundRecording</Type>
      <ResourceId><ISRC>USRC17607839</ISRC></ResourceId>
      <DisplayTitleText>First Light &amp; Shadow</DisplayTitleText>
      <DisplayArtistName>The Example Band</DisplayArtistName>
      <DisplayArtist SequenceNumber="1">
        <ArtistPartyReference>P1</ArtistPartyReference>
        <DisplayArtistRole>MainArtist</DisplayArtistRole>
      </DisplayArtist>
      <Contributor SequenceNumber="1">
        <ContributorPartyReference>P2</ContributorPartyReference>
        <Role>Composer</Role>
      </Contributor>
      <Duration>PT3M45S</Duration>
      <custom:QualityRating>Hi-Res</custom:QualityRating>
    </SoundRecording>
    <SoundRecording>
      <ResourceReference>A2</ResourceReference>
      <Type>MusicalWorkSoundRecording</Type>
      <ResourceId><ISRC>USRC17607840</ISRC></ResourceId>
      <DisplayTitleText>Second Wind</DisplayTitleText>
      <DisplayArtistName>The Example Band</DisplayArtistName>
      <Duration>PT4M2.5S</Duration>
    </SoundRecording>
    <Image>
      <ResourceReference>A3</ResourceReference>
      <Type spotify:variant="square">FrontCoverImage</Type>
      <ResourceId><ProprietaryId Namespace="PADPIDA2014120301A">IMG-1</ProprietaryId></ResourceId>
    </Image>
  </ResourceList>
  <ReleaseList>
    <Release>
      <ReleaseReference>R1</ReleaseReference>
      <ReleaseType>Album</ReleaseType>
      <ReleaseId><ICPN>0123456789012</ICPN></ReleaseId>
      <DisplayTitleText>Example Album</DisplayTitleText>
      <DisplayArtistName>The Example Band</DisplayArtistName>
      <DisplayArtist SequenceNumber="1">
        <ArtistPartyReference>P1</ArtistPartyReference>
        <DisplayArtistRole>MainArtist</DisplayArtistRole>
      </DisplayArtist>
      <Genre><GenreText>Electronic</GenreText></Genre>
      <ReleaseDate>2024-08-01</ReleaseDate>
      <ResourceGroup>
        <ResourceGroupContentItem>
          <SequenceNumber>1</SequenceNumber>
          <ReleaseResourceReference>A2</ReleaseResourceReference>
        </ResourceGroupContentItem>
        <ResourceGroupContentItem>
          <SequenceNumber>2</SequenceNumber>
          <ReleaseResourceReference>A1</ReleaseResourceReference>
        </ResourceGroupContentItem>
        <LinkedReleaseResourceReference>A3</LinkedReleaseResourceReference>
      </ResourceGroup>
    </Release>
    <TrackRelease>
      <ReleaseReference>R2</ReleaseReference>
      <ReleaseId><ISRC>USRC17607839</ISRC></ReleaseId>
      <ReleaseResourceReference>A1</ReleaseResourceReference>
    </TrackRelease>
  </ReleaseList>
  <DealList>
    <ReleaseDeal>
      <DealReleaseReference>R2</DealReleaseReference>
      <Deal>
        <DealTerms>
          <TerritoryCode>Worldwide</TerritoryCode>
          <ValidityPeriod><StartDate>2024-08-01</StartDate></ValidityPeriod>
          <CommercialModelType>SubscriptionModel</CommercialModelType>
          <UseType>OnDemandStream</UseType>
        </DealTerms>
      </Deal>
    </ReleaseDeal>
    <ReleaseDeal>
      <DealReleaseReference>R1</DealReleaseReference>
      <Deal>
        <DealTerms>
          <TerritoryCode>Worldwide</TerritoryCode>
          <ValidityPeriod><StartDate>2024-09-01</StartDate></ValidityPeriod>
          <CommercialModelType>AdvertisementSupportedModel</CommercialModelType>
          <UseType>OnDemandStream</UseType>
        </DealTerms>
      </Deal>
      <Deal>
        <DealTerms>
          <TerritoryCode>Worldwide</TerritoryCode>
          <ValidityPeriod><StartDate>2024-08-01</StartDate></ValidityPeriod>
          <CommercialModelType>PayAsYouGoModel</CommercialModelType>
          <UseType>PermanentDownload</UseType>
        </DealTerms>
      </Deal>
    </ReleaseDeal>
  </DealList>
</ern:NewReleaseMessage>
"#;

/// ERN 3.8.2 single with the legacy per-territory layout
pub const ERN382_SINGLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- exported by the label system -->
<ernm:NewReleaseMessage xmlns:ernm="http://ddex.net/xml/ern/382" xmlns:lbl="urn:example:label" MessageSchemaVersionId="ern/382" LanguageAndScriptCode="en">
  <MessageHeader>
    <MessageThreadId>T-382</MessageThreadId>
    <MessageId>MSG-382-0001</MessageId>
    <MessageSender>
      <PartyId>PADPIDA2014120301A</PartyId>
      <PartyName><FullName>Example Records</FullName></PartyName>
    </MessageSender>
    <MessageRecipient>
      <PartyId>PADPIDA2015010101B</PartyId>
    </MessageRecipient>
    <MessageCreatedDateTime>2024-07-01T10:00:00Z</MessageCreatedDateTime>
  </MessageHeader>
  <UpdateIndicator>OriginalMessage</UpdateIndicator>
  <ResourceList>
    <SoundRecording>
      <SoundRecordingType>MusicalWorkSoundRecording</SoundRecordingType>
      <SoundRecordingId><ISRC>GBAYE0601498</ISRC></SoundRecordingId>
      <ResourceReference>A1</ResourceReference>
      <ReferenceTitle><TitleText>Night Drive</TitleText></ReferenceTitle>
      <Duration>PT5M1S</Duration>
      <SoundRecordingDetailsByTerritory>
        <TerritoryCode>Worldwide</TerritoryCode>
        <Title TitleType="DisplayTitle"><TitleText>Night Drive</TitleText></Title>
        <DisplayArtist>
          <PartyName><FullName>DJ Example</FullName></PartyName>
          <ArtistRole>MainArtist</ArtistRole>
        </DisplayArtist>
        <lbl:Mood>nocturnal</lbl:Mood>
      </SoundRecordingDetailsByTerritory>
    </SoundRecording>
  </ResourceList>
  <ReleaseList>
    <Release>
      <ReleaseId><ICPN>5012345678900</ICPN></ReleaseId>
      <ReleaseReference>R0</ReleaseReference>
      <ReferenceTitle><TitleText>Night Drive</TitleText></ReferenceTitle>
      <ReleaseResourceReferenceList>
        <ReleaseResourceReference ReleaseResourceType="PrimaryResource">A1</ReleaseResourceReference>
      </ReleaseResourceReferenceList>
      <ReleaseType>Single</ReleaseType>
      <ReleaseDetailsByTerritory>
        <TerritoryCode>Worldwide</TerritoryCode>
        <DisplayArtistName>DJ Example</DisplayArtistName>
        <Genre><GenreText>House</GenreText></Genre>
        <ReleaseDate>2024-08-01</ReleaseDate>
      </ReleaseDetailsByTerritory>
    </Release>
  </ReleaseList>
  <DealList>
    <ReleaseDeal>
      <DealReleaseReference>R0</DealReleaseReference>
      <Deal>
        <DealTerms>
          <CommercialModelType>PayAsYouGoModel</CommercialModelType>
          <Usage><UseType>PermanentDownload</UseType></Usage>
          <TerritoryCode>Worldwide</TerritoryCode>
          <ValidityPeriod><StartDate>2024-08-01</StartDate></ValidityPeriod>
        </DealTerms>
      </Deal>
    </ReleaseDeal>
  </DealList>
</ernm:NewReleaseMessage>
"#;

/// ERN 4.2 with a default namespace, so every element is qualified
pub const ERN42_DEFAULT_NS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<NewReleaseMessage xmlns="http://ddex.net/xml/ern/42" MessageSchemaVersionId="ern/42">
  <MessageHeader>
    <MessageId>MSG-42-0001</MessageId>
    <MessageSender><PartyId>PADPIDA2014120301A</PartyId></MessageSender>
    <MessageCreatedDateTime>2024-07-01T10:00:00Z</MessageCreatedDateTime>
  </MessageHeader>
  <ResourceList>
    <SoundRecording>
      <ResourceReference>A1</ResourceReference>
      <ResourceId><ISRC>FRZ039800212</ISRC></ResourceId>
      <DisplayTitleText>Quiet</DisplayTitleText>
      <Duration>PT2M</Duration>
    </SoundRecording>
  </ResourceList>
  <ReleaseList>
    <Release>
      <ReleaseReference>R1</ReleaseReference>
      <ReleaseId><ICPN>012345678905</ICPN></ReleaseId>
      <DisplayTitleText>Quiet</DisplayTitleText>
      <ResourceGroup>
        <ResourceGroupContentItem>
          <ReleaseResourceReference>A1</ReleaseResourceReference>
        </ResourceGroupContentItem>
      </ResourceGroup>
    </Release>
  </ReleaseList>
</NewReleaseMessage>
"#;

/// Every fixture with a name for assertion messages
pub fn all() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ern43_album", ERN43_ALBUM),
        ("ern382_single", ERN382_SINGLE),
        ("ern42_default_ns", ERN42_DEFAULT_NS),
    ]
}

/// Write `content` to a temporary file
pub fn temp_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
