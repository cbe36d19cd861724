//! AAF-style XML interchange serializer
//!
//! Layout:
//! - `Header/Identification`
//! - `Content/CompositionMob` with a `TimelineMobSlot` (one `SourceClip`
//!   per track) and an `EventMobSlot` (one `CommentMarker` per marker)
//! - one `SourceMob` per track, holding a `PCMDescriptor` with a
//!   `NetworkLocator` pointing at the bundled file
//!
//! All positions and lengths are in samples at the job's sample rate:
//! `round(seconds * sample_rate)`.

use mixnote_common::time::seconds_to_samples;
use mixnote_common::{IdGenerator, Identifier};

use super::ExportJob;
use crate::asset::AudioAsset;

/// Voice notes are recorded mono
const VOICE_CHANNELS: u16 = 1;

struct SourceTrack {
    mob_id: Identifier,
    name: String,
    file_name: String,
    position: u64,
    length: u64,
    channels: u16,
}

/// Render `job` as an AAF-style XML document
pub fn serialize(job: &ExportJob, asset: &AudioAsset, ids: &mut dyn IdGenerator) -> String {
    let rate = job.sample_rate_hz;
    let bits = job.bits_per_sample(asset);

    let primary_file = asset.bundle_file_name();
    let mut tracks = vec![SourceTrack {
        mob_id: ids.next(),
        name: job.project_title.clone(),
        file_name: primary_file,
        position: 0,
        length: seconds_to_samples(asset.duration_seconds, rate),
        channels: asset.channel_count,
    }];
    for voice in job.included_voice_tracks() {
        tracks.push(SourceTrack {
            mob_id: ids.next(),
            name: format!("Voice: {}", voice.author),
            file_name: voice.file_name.clone(),
            position: seconds_to_samples(voice.timestamp_seconds, rate),
            length: seconds_to_samples(voice.duration_seconds, rate),
            channels: VOICE_CHANNELS,
        });
    }

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<AAF version=\"1.1\">\n");

    xml.push_str("  <Header>\n");
    xml.push_str("    <Identification>\n");
    xml.push_str("      <CompanyName>Mixnote</CompanyName>\n");
    xml.push_str(&format!(
        "      <ProductName>{}</ProductName>\n",
        env!("CARGO_PKG_NAME")
    ));
    xml.push_str(&format!(
        "      <ProductVersion>{}</ProductVersion>\n",
        env!("CARGO_PKG_VERSION")
    ));
    xml.push_str("    </Identification>\n");
    xml.push_str("  </Header>\n");

    xml.push_str("  <Content>\n");
    xml.push_str(&format!(
        "    <CompositionMob MobID=\"{}\" Name=\"{}\">\n",
        ids.next(),
        escape_xml(&job.project_title)
    ));

    xml.push_str(&format!(
        "      <TimelineMobSlot SlotID=\"1\" EditRate=\"{}\">\n",
        rate
    ));
    xml.push_str("        <Sequence>\n");
    for track in &tracks {
        xml.push_str(&format!(
            "          <SourceClip SourceID=\"{}\" Position=\"{}\" Length=\"{}\" Name=\"{}\"/>\n",
            track.mob_id,
            track.position,
            track.length,
            escape_xml(&track.name)
        ));
    }
    xml.push_str("        </Sequence>\n");
    xml.push_str("      </TimelineMobSlot>\n");

    xml.push_str(&format!(
        "      <EventMobSlot SlotID=\"2\" EditRate=\"{}\">\n",
        rate
    ));
    for marker in &job.markers {
        xml.push_str(&format!(
            "        <CommentMarker Position=\"{}\">\n",
            seconds_to_samples(marker.timestamp_seconds, rate)
        ));
        xml.push_str(&format!("          <Name>{}</Name>\n", escape_xml(&marker.label)));
        xml.push_str(&format!(
            "          <Comment Author=\"{}\">{}</Comment>\n",
            escape_xml(&marker.author),
            escape_xml(&marker.comment)
        ));
        xml.push_str(&format!("          <Color>{}</Color>\n", marker.color.hex()));
        xml.push_str(&format!("          <Kind>{}</Kind>\n", marker.kind.as_str()));
        xml.push_str("        </CommentMarker>\n");
    }
    xml.push_str("      </EventMobSlot>\n");
    xml.push_str("    </CompositionMob>\n");

    for track in &tracks {
        xml.push_str(&format!(
            "    <SourceMob MobID=\"{}\" Name=\"{}\">\n",
            track.mob_id,
            escape_xml(&track.file_name)
        ));
        xml.push_str(&format!(
            "      <PCMDescriptor SampleRate=\"{}\" Channels=\"{}\" QuantizationBits=\"{}\" Length=\"{}\">\n",
            rate, track.channels, bits, track.length
        ));
        xml.push_str(&format!(
            "        <NetworkLocator URLString=\"{}\"/>\n",
            escape_xml(&track.file_name)
        ));
        xml.push_str("      </PCMDescriptor>\n");
        xml.push_str("    </SourceMob>\n");
    }

    xml.push_str("  </Content>\n");
    xml.push_str("</AAF>\n");
    xml
}

/// Escape text for attribute or element content
///
/// C0 controls other than tab, LF and CR are not legal XML 1.0 characters
/// in any form and are dropped.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push('\t'),
            c if c < '\u{20}' => {}
            c => out.push(c),
        }
    }
    out
}
