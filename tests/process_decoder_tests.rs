#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use stripview::decode::{Decoder, HelperDecoder, PixelSource, ReadBuffer};
use stripview::error::{DecodeError, ProtocolError};
use stripview::layout::HeightState;
use stripview::surface::{DisplaySurface, PixelFormat, Rgb};
use stripview::test_utils::{farbfeld_image, solid_image};
use stripview::{Compositor, Document, Palette, Viewport};

const CAT: &str = "/bin/cat";
const TEAL: Rgb = Rgb::new(0x00, 0x80, 0x80);

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = write_file(dir, name, format!("#!/bin/sh\n{body}\n").as_bytes());
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn locator(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn drain(source: &mut dyn PixelSource) -> Vec<Rgb> {
    let mut buf = ReadBuffer::new();
    let mut pixels = Vec::new();
    while let Some(chunk) = source.read_chunk(&mut buf).unwrap() {
        pixels.extend(chunk);
    }
    pixels
}

#[test]
#[serial]
fn stdin_variant_feeds_the_file_to_the_helper() {
    let dir = TempDir::new().unwrap();
    let colors = |x: u32, y: u32| Rgb::new(x as u8, y as u8, 7);
    let image = write_file(&dir, "page.ff", &farbfeld_image(30, 20, colors));

    let mut decoder = HelperDecoder::stdin(CAT);
    let mut source = decoder.open(locator(&image)).unwrap();
    let header = source.read_header().unwrap();
    assert_eq!((header.width, header.height), (30, 20));

    let pixels = drain(source.as_mut());
    source.finish();
    assert_eq!(pixels.len(), 600);
    assert_eq!(pixels[0], colors(0, 0));
    assert_eq!(pixels[599], colors(29, 19));
}

#[test]
#[serial]
fn argument_variant_passes_the_locator() {
    let dir = TempDir::new().unwrap();
    let image = write_file(&dir, "panel.ff", &solid_image(4, 4, TEAL));

    let mut decoder = HelperDecoder::argument(CAT);
    let mut source = decoder.open(locator(&image)).unwrap();
    source.read_header().unwrap();
    assert_eq!(drain(source.as_mut()), vec![TEAL; 16]);
}

#[test]
#[serial]
fn missing_file_is_a_setup_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.ff");

    let mut decoder = HelperDecoder::stdin(CAT);
    match decoder.open(locator(&missing)) {
        Err(DecodeError::Setup { context, .. }) => assert!(context.starts_with("open(")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("opened a missing file"),
    }
}

#[test]
#[serial]
fn missing_program_is_a_setup_error() {
    let mut decoder = HelperDecoder::argument("/nonexistent/helper");
    match decoder.open("item") {
        Err(DecodeError::Setup { context, .. }) => assert!(context.starts_with("spawn(")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("spawned a missing program"),
    }
}

#[test]
#[serial]
fn silent_helper_yields_short_header() {
    let mut decoder = HelperDecoder::argument("/bin/false");
    let mut source = decoder.open("item").unwrap();
    assert!(matches!(
        source.read_header(),
        Err(DecodeError::Protocol(ProtocolError::ShortHeader { got: 0 }))
    ));
    source.finish();
}

#[test]
#[serial]
fn failing_exit_keeps_delivered_pixels() {
    let dir = TempDir::new().unwrap();
    let image = write_file(&dir, "strip.ff", &solid_image(8, 12, TEAL));
    let helper = write_script(&dir, "helper.sh", "cat \"$1\"\nexit 3");

    let mut decoder = HelperDecoder::argument(&helper);
    let mut document = Document::new([locator(&image)], 200);
    let viewport = Viewport::new(8, 12);
    let mut surface = DisplaySurface::new(8, 12, PixelFormat::Xrgb32);

    let extents = Compositor::new(Palette::default()).render(
        &mut document,
        &mut decoder,
        &viewport,
        &mut surface,
    );

    assert_eq!(extents.total_height, 12);
    assert_eq!(surface.pixel(7, 11), Some(TEAL));
}

#[test]
#[serial]
fn finishing_early_stops_a_busy_helper() {
    let dir = TempDir::new().unwrap();
    // Several pipe buffers' worth, so the helper blocks on write.
    let image = write_file(&dir, "huge.ff", &solid_image(512, 256, TEAL));

    let mut decoder = HelperDecoder::stdin(CAT);
    let mut source = decoder.open(locator(&image)).unwrap();
    source.read_header().unwrap();
    let mut buf = ReadBuffer::new();
    assert!(source.read_chunk(&mut buf).unwrap().is_some());
    source.finish();
}

#[test]
#[serial]
fn broken_items_are_painted_as_errors() {
    let dir = TempDir::new().unwrap();
    let good = write_file(&dir, "good.ff", &solid_image(10, 10, TEAL));
    let garbage = write_file(&dir, "garbage.ff", b"GIF89a not farbfeld at all");
    let missing = dir.path().join("missing.ff");

    let mut decoder = HelperDecoder::stdin(CAT);
    let mut document = Document::new(
        [locator(&good), locator(&garbage), locator(&missing)],
        15,
    );
    let viewport = Viewport::new(10, 60);
    let mut surface = DisplaySurface::new(10, 60, PixelFormat::Rgb24);

    let extents = Compositor::new(Palette::default()).render(
        &mut document,
        &mut decoder,
        &viewport,
        &mut surface,
    );

    assert_eq!(extents.total_height, 40);
    assert_eq!(document.item(1).unwrap().height_state(), HeightState::Placeholder(15));
    assert_eq!(document.item(2).unwrap().height_state(), HeightState::Placeholder(15));
    assert_eq!(surface.pixel(0, 9), Some(TEAL));
    assert_eq!(surface.pixel(0, 10), Some(Rgb::RED));
    assert_eq!(surface.pixel(9, 39), Some(Rgb::RED));
    assert_eq!(surface.pixel(0, 40), Some(Rgb::BLACK));
}
