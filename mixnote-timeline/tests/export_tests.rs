//! Export pipeline integration tests
//!
//! Annotations → markers → REAPER/XML project text → bundle on disk, with
//! audio served from temporary files.

mod helpers;

use std::sync::Arc;

use helpers::{annotation, asset, sine_wav_bytes, voice_annotation, write_wav};
use mixnote_common::config::ExportConfig;
use mixnote_common::{RandomIds, SequentialIds};
use mixnote_timeline::export::{Bundler, CapabilityFlags, ExportFormat, ExportJob};
use mixnote_timeline::fetch::FileFetcher;
use mixnote_timeline::markers::{Annotation, AnnotationType, Priority};
use quick_xml::events::Event;
use quick_xml::Reader;

fn config() -> ExportConfig {
    ExportConfig {
        voice_fetch_delay_ms: 5,
        ..ExportConfig::default()
    }
}

fn review_annotations(voice_locations: &[String]) -> Vec<Annotation> {
    let mut annotations = vec![
        annotation("c1", 42.0, AnnotationType::Section, Priority::Low, "Chorus"),
        annotation("c2", 5.0, AnnotationType::Issue, Priority::Critical, "Vocal clips"),
        annotation("c3", 5.0, AnnotationType::Comment, Priority::Low, "Nice reverb"),
        annotation(
            "c4",
            18.25,
            AnnotationType::Approval,
            Priority::Medium,
            "This bridge section is exactly what we talked about last week, ship it",
        ),
    ];
    let mut reply = annotation("r1", 5.5, AnnotationType::Comment, Priority::Low, "agreed");
    reply.parent_id = Some("c2".to_string());
    annotations.push(reply);

    for (i, location) in voice_locations.iter().enumerate() {
        annotations.push(voice_annotation(&format!("v{}", i + 1), 10.0 * (i + 1) as f64, location));
    }
    annotations
}

fn count_xml_elements(xml: &str, tag: &str) -> usize {
    let mut reader = Reader::from_str(xml);
    let mut count = 0;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == tag.as_bytes() => count += 1,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("XML parse error at {}: {}", reader.buffer_position(), e),
        }
    }
    count
}

#[test]
fn test_reaper_markers_numbered_in_stable_timestamp_order() {
    let job = ExportJob::from_annotations(
        "Review",
        48_000,
        &review_annotations(&[]),
        CapabilityFlags::default(),
        &config(),
    );
    let text = ExportFormat::Reaper.serialize(&job, &asset("mix.wav", "mix.wav", 60.0), &mut SequentialIds::new());

    let markers: Vec<&str> = text
        .lines()
        .map(str::trim_start)
        .filter(|l| l.starts_with("MARKER "))
        .collect();
    assert_eq!(markers.len(), 4, "reply must not become a marker");
    assert!(markers[0].starts_with("MARKER 1 5.000000 \"🔴⚠️ alex: Vocal clips\""));
    assert!(markers[1].starts_with("MARKER 2 5.000000 \"💬 alex: Nice reverb\""));
    assert!(markers[2].starts_with(
        "MARKER 3 18.250000 \"✅ alex: This bridge section is exactly what we talked a...\""
    ));
    assert!(markers[3].starts_with("MARKER 4 42.000000 \"📍 alex: Chorus\""));
    assert!(text.contains("MAXPROJLEN 0 90\n"));
}

#[test]
fn test_xml_is_well_formed_and_complete() {
    let voices = vec!["v1.webm".to_string(), "v2.webm".to_string()];
    let job = ExportJob::from_annotations(
        "Review <draft> & notes",
        48_000,
        &review_annotations(&voices),
        CapabilityFlags {
            voice_notes_allowed: true,
        },
        &config(),
    );
    let xml = ExportFormat::AafXml.serialize(&job, &asset("mix.wav", "mix.wav", 60.0), &mut RandomIds::new());

    assert_eq!(count_xml_elements(&xml, "CompositionMob"), 1);
    assert_eq!(count_xml_elements(&xml, "SourceClip"), 3);
    assert_eq!(count_xml_elements(&xml, "SourceMob"), 3);
    // 4 comment/section markers + 2 voice annotations
    assert_eq!(count_xml_elements(&xml, "CommentMarker"), 6);
    assert!(xml.contains("Position=\"240000\""));
}

#[tokio::test]
async fn test_bundle_skips_one_of_three_voice_notes() {
    let dir = tempfile::tempdir().unwrap();
    let mix = dir.path().join("mix.wav");
    write_wav(&mix, &sine_wav_bytes(2.0, 2));

    let mut voices = Vec::new();
    for name in ["v1.wav", "v2.wav", "v3.wav"] {
        let path = dir.path().join(name);
        if name != "v2.wav" {
            write_wav(&path, &sine_wav_bytes(0.5, 1));
        }
        voices.push(path.to_string_lossy().to_string());
    }

    let job = ExportJob::from_annotations(
        "Band Review #3",
        8_000,
        &review_annotations(&voices),
        CapabilityFlags {
            voice_notes_allowed: true,
        },
        &config(),
    );
    let primary = asset(&mix.to_string_lossy(), "mix.wav", 2.0);

    let bundle = Bundler::new(Arc::new(FileFetcher), config())
        .bundle(&job, &primary, &ExportFormat::ALL, &mut RandomIds::new())
        .await
        .unwrap();

    assert_eq!(bundle.skipped_count(), 1);
    assert_eq!(bundle.skipped[0].annotation_id, "v2");
    let voice_files: Vec<&str> = bundle
        .files
        .iter()
        .map(|f| f.name.as_str())
        .filter(|n| n.starts_with("voice_"))
        .collect();
    assert_eq!(voice_files, vec!["voice_01_alex.wav", "voice_03_alex.wav"]);

    let out = dir.path().join("bundle");
    let written = bundle.write_to_dir(&out).await.unwrap();
    assert_eq!(written.len(), 6);

    let rpp = std::fs::read_to_string(out.join("Band Review 3.rpp")).unwrap();
    assert_eq!(rpp.matches("<TRACK ").count(), 4);

    let instructions = std::fs::read_to_string(out.join("Band Review 3_IMPORT_INSTRUCTIONS.txt")).unwrap();
    assert!(instructions.contains("MISSING VOICE NOTES (1)"));
    assert!(instructions.contains("Band Review 3.rpp"));
    assert!(instructions.contains("mix.wav"));

    let copied = std::fs::read(out.join("mix.wav")).unwrap();
    assert_eq!(copied, std::fs::read(&mix).unwrap());
}

#[tokio::test]
async fn test_bundle_fails_when_primary_audio_missing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone.wav");

    let job = ExportJob::from_annotations("Review", 48_000, &[], CapabilityFlags::default(), &config());
    let err = Bundler::new(Arc::new(FileFetcher), config())
        .bundle(
            &job,
            &asset(&missing.to_string_lossy(), "gone.wav", 10.0),
            &[ExportFormat::Reaper],
            &mut RandomIds::new(),
        )
        .await
        .unwrap_err();

    assert!(err.is_fatal_fetch());
    assert!(err.to_string().contains("gone.wav"));
}
