//! End-to-end record/verify runs against a temporary reference directory.
//!
//! Renders come from `SolidRenderer`, which fills the requested size with a
//! single color, so expected artifacts can be checked byte for byte.

use std::fs;
use std::time::Duration;

use viewsnap::{
    ArtifactKind, CollectingReporter, Mode, PanicReporter, PixelBuffer, PixelFormat,
    SnapshotIdentity, SnapshotStore, Size, Verdict,
};

mod snap;
use snap::{case_x, Fixture, SolidRenderer, GREEN, RED};

const BUTTON: Size = Size::new(44, 44);

fn record_red(fixture: &Fixture) {
    let outcome = fixture
        .engine
        .snapshot(&case_x(Mode::Record), &mut SolidRenderer::new(), &RED, BUTTON, "normal")
        .unwrap();
    assert_eq!(outcome.verdict(), None);
}

fn scratch_files(fixture: &Fixture) -> Vec<String> {
    let dir = fixture.tmp_dir().join("CaseX");
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn record_writes_reference_and_fails() {
    let fixture = Fixture::new();
    let mut reporter = CollectingReporter::new();

    fixture.engine.assert_snapshot(
        &case_x(Mode::Record),
        &mut SolidRenderer::new(),
        &RED,
        BUTTON,
        "normal",
        &mut reporter,
    );

    let path = fixture.ref_dir().join("CaseX").join("test_button-normal.png");
    let written = PixelBuffer::from_encoded_bytes(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(
        written,
        PixelBuffer::filled(44, 44, PixelFormat::Rgba8Premultiplied, &RED).unwrap()
    );

    assert_eq!(reporter.successes(), 0);
    let (message, location) = &reporter.failures()[0];
    assert!(message.starts_with("Recorded new reference image"), "{}", message);
    assert!(message.contains(&path.display().to_string()), "{}", message);
    assert!(location.file.ends_with("main.rs"), "{}", location);
}

#[test]
fn verify_after_record_matches() {
    let fixture = Fixture::new();
    record_red(&fixture);

    let mut reporter = CollectingReporter::new();
    fixture.engine.assert_snapshot(
        &case_x(Mode::Verify),
        &mut SolidRenderer::new(),
        &RED,
        BUTTON,
        "normal",
        &mut reporter,
    );

    assert_eq!(reporter.successes(), 1);
    assert!(reporter.failures().is_empty());
    assert!(scratch_files(&fixture).is_empty());
}

#[test]
fn changed_color_writes_diagnostics() {
    let fixture = Fixture::new();
    record_red(&fixture);

    let outcome = fixture
        .engine
        .snapshot(&case_x(Mode::Verify), &mut SolidRenderer::new(), &GREEN, BUTTON, "normal")
        .unwrap();
    assert_eq!(outcome.verdict(), Some(Verdict::Mismatch));

    let failed_path = fixture.tmp_dir().join("CaseX").join("test_button-normal%failed.png");
    let diff_path = fixture.tmp_dir().join("CaseX").join("test_button-normal%diff.png");
    let message = outcome.failure_message().unwrap();
    assert!(message.contains("1936 of 1936 pixels differ"), "{}", message);
    assert!(message.contains(&failed_path.display().to_string()), "{}", message);
    assert!(message.contains(&diff_path.display().to_string()), "{}", message);

    let failed = PixelBuffer::from_encoded_bytes(&fs::read(&failed_path).unwrap()).unwrap();
    assert_eq!(failed.pixel_rgba(0, 0), Some(GREEN));
    let diff = PixelBuffer::from_encoded_bytes(&fs::read(&diff_path).unwrap()).unwrap();
    assert_eq!(diff.size(), BUTTON);
    assert_eq!(diff.pixel_rgba(43, 43), Some([255, 0, 0, 255]));
}

#[test]
fn smaller_render_is_dimension_mismatch() {
    let fixture = Fixture::new();
    record_red(&fixture);

    let outcome = fixture
        .engine
        .snapshot(
            &case_x(Mode::Verify),
            &mut SolidRenderer::new(),
            &RED,
            Size::new(10, 10),
            "normal",
        )
        .unwrap();

    assert_eq!(outcome.verdict(), Some(Verdict::DimensionMismatch));
    let message = outcome.failure_message().unwrap();
    assert!(message.contains("expected 44x44, got 10x10"), "{}", message);
}

#[test]
fn never_recorded_is_reference_missing() {
    let fixture = Fixture::new();

    let outcome = fixture
        .engine
        .snapshot(&case_x(Mode::Verify), &mut SolidRenderer::new(), &RED, BUTTON, "normal")
        .unwrap();

    assert_eq!(outcome.verdict(), Some(Verdict::ReferenceMissing));
    let message = outcome.failure_message().unwrap();
    assert!(message.contains("never recorded"), "{}", message);
    assert!(!fixture.ref_dir().join("CaseX").exists());
}

#[test]
fn empty_size_fails_the_test() {
    let fixture = Fixture::new();
    let mut reporter = CollectingReporter::new();

    fixture.engine.assert_snapshot(
        &case_x(Mode::Record),
        &mut SolidRenderer::new(),
        &RED,
        Size::new(44, 0),
        "normal",
        &mut reporter,
    );

    let (message, _) = &reporter.failures()[0];
    assert!(message.contains("zero height"), "{}", message);
    assert!(!fixture.ref_dir().exists());
}

#[test]
fn scale_factor_selects_file_and_pixels() {
    let fixture = Fixture::new();
    let mut renderer = SolidRenderer::new();
    renderer.scale = 2;

    fixture
        .engine
        .snapshot(&case_x(Mode::Record), &mut renderer, &RED, BUTTON, "normal")
        .unwrap();

    let path = fixture.ref_dir().join("CaseX").join("test_button-normal@2x.png");
    let written = PixelBuffer::from_encoded_bytes(&fs::read(path).unwrap()).unwrap();
    assert_eq!(written.size(), Size::new(88, 88));

    let outcome = fixture
        .engine
        .snapshot(&case_x(Mode::Verify), &mut renderer, &RED, BUTTON, "normal")
        .unwrap();
    assert_eq!(outcome.verdict(), Some(Verdict::Match));
}

#[test]
fn row_padding_does_not_affect_verdict() {
    let fixture = Fixture::new();
    record_red(&fixture);

    let mut renderer = SolidRenderer::new();
    renderer.row_padding = 12;
    let outcome = fixture
        .engine
        .snapshot(&case_x(Mode::Verify), &mut renderer, &RED, BUTTON, "normal")
        .unwrap();
    assert_eq!(outcome.verdict(), Some(Verdict::Match));
}

#[test]
fn fuzzy_config_tolerates_small_differences() {
    let fixture = Fixture::with_config("[compare]\nfuzzy = true\nchannel_tolerance = 3");
    record_red(&fixture);

    let outcome = fixture
        .engine
        .snapshot(
            &case_x(Mode::Verify),
            &mut SolidRenderer::new(),
            &[253, 2, 0, 255],
            BUTTON,
            "normal",
        )
        .unwrap();
    assert_eq!(outcome.verdict(), Some(Verdict::Match));

    let outcome = fixture
        .engine
        .snapshot(
            &case_x(Mode::Verify),
            &mut SolidRenderer::new(),
            &[250, 0, 0, 255],
            BUTTON,
            "normal",
        )
        .unwrap();
    assert_eq!(outcome.verdict(), Some(Verdict::Mismatch));
}

#[test]
fn settle_uses_configured_timeout() {
    let fixture = Fixture::with_config("settle_timeout = \"5ms\"");
    let mut renderer = SolidRenderer::new();
    fixture
        .engine
        .snapshot(&case_x(Mode::Record), &mut renderer, &RED, BUTTON, "")
        .unwrap();
    assert_eq!(renderer.settled, Some(Duration::from_millis(5)));
    assert!(fixture.ref_dir().join("CaseX").join("test_button-.png").exists());
}

#[test]
fn unwritable_scratch_keeps_mismatch() {
    let fixture = Fixture::new();
    record_red(&fixture);
    fs::write(fixture.tmp_dir(), b"not a directory").unwrap();

    let outcome = fixture
        .engine
        .snapshot(&case_x(Mode::Verify), &mut SolidRenderer::new(), &GREEN, BUTTON, "normal")
        .unwrap();

    assert_eq!(outcome.verdict(), Some(Verdict::Mismatch));
    let message = outcome.failure_message().unwrap();
    assert!(message.starts_with("Image data does not match reference"), "{}", message);
    assert!(message.contains("could not write failed image"), "{}", message);
    assert!(message.contains("could not write diff image"), "{}", message);
}

#[test]
fn corrupt_reference_is_reported_as_missing() {
    let fixture = Fixture::new();
    let store = SnapshotStore::new(viewsnap::store::Params {
        reference_dir: fixture.ref_dir(),
        scratch_dir: fixture.tmp_dir(),
    });
    let path = store.path_for(
        &SnapshotIdentity::new("CaseX", "test_button", "normal"),
        ArtifactKind::Reference,
        1,
    );
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"garbage").unwrap();

    let outcome = fixture
        .engine
        .snapshot(&case_x(Mode::Verify), &mut SolidRenderer::new(), &RED, BUTTON, "normal")
        .unwrap();

    assert_eq!(outcome.verdict(), Some(Verdict::ReferenceMissing));
    let message = outcome.failure_message().unwrap();
    assert!(message.starts_with("Unable to load reference image"), "{}", message);
    assert!(message.contains("failed to read png info"), "{}", message);
    assert!(message.contains("record mode"), "{}", message);
    assert_eq!(scratch_files(&fixture), vec!["test_button-normal%failed.png"]);
    assert_eq!(fs::read(&path).unwrap(), b"garbage");
}

#[test]
fn directory_in_place_of_reference_is_reference_missing() {
    let fixture = Fixture::new();
    let path = fixture.ref_dir().join("CaseX").join("test_button-normal.png");
    fs::create_dir_all(&path).unwrap();

    let outcome = fixture
        .engine
        .snapshot(&case_x(Mode::Verify), &mut SolidRenderer::new(), &RED, BUTTON, "normal")
        .unwrap();

    assert_eq!(outcome.verdict(), Some(Verdict::ReferenceMissing));
    let message = outcome.failure_message().unwrap();
    assert!(message.starts_with("Unable to load reference image"), "{}", message);
}

#[test]
fn buffers_can_be_checked_directly() {
    let fixture = Fixture::new();
    let case = case_x(Mode::Record);
    let buffer = PixelBuffer::from_premultiplied_argb(2, 2, &[0xff00ff00; 4]).unwrap();

    let mut reporter = CollectingReporter::new();
    fixture
        .engine
        .assert_buffer(&case, buffer.clone(), 1, "argb", &mut reporter);
    fixture
        .engine
        .assert_buffer(&case_x(Mode::Verify), buffer, 1, "argb", &mut reporter);

    assert_eq!(reporter.failures().len(), 1);
    assert_eq!(reporter.successes(), 1);
}

#[test]
#[should_panic(expected = "main.rs")]
fn panic_reporter_points_at_test() {
    let fixture = Fixture::new();
    fixture.engine.assert_snapshot(
        &case_x(Mode::Verify),
        &mut SolidRenderer::new(),
        &RED,
        BUTTON,
        "missing",
        &mut PanicReporter,
    );
}
