//! Shared fixtures for the unit and integration tests: synthesized JPEG
//! files, EXIF GPS read-back, and a single-shot HTTP server standing in
//! for the Graph API.

use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread;

use exif::{Field, In, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::ImageEXIF;

use crate::settings::Settings;

/// Write a small JPEG with no EXIF segment and return its path.
pub fn jpeg_fixture(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([120, 180, 240]));
    img.save(&path).unwrap();
    path
}

/// Write a small JPEG carrying a single 0th-IFD Make field.
pub fn jpeg_fixture_with_make(dir: &Path, name: &str, make: &str) -> PathBuf {
    let path = jpeg_fixture(dir, name);

    let make_field = Field {
        tag: Tag::Make,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![make.as_bytes().to_vec()]),
    };
    let mut writer = exif::experimental::Writer::new();
    writer.push_field(&make_field);
    let mut buffer = Cursor::new(Vec::new());
    writer.write(&mut buffer, false).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let mut jpeg = Jpeg::from_bytes(bytes.into()).unwrap();
    jpeg.set_exif(Some(buffer.into_inner().into()));
    std::fs::write(&path, jpeg.encoder().bytes()).unwrap();
    path
}

/// Write a small JPEG whose EXIF carries a 0th-IFD Make field and an
/// embedded thumbnail JPEG. Returns the path and the thumbnail bytes for
/// later comparison.
pub fn jpeg_fixture_with_thumbnail(dir: &Path, name: &str, make: &str) -> (PathBuf, Vec<u8>) {
    let path = jpeg_fixture(dir, name);

    let thumb_img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 40, 40]));
    let mut thumb = Cursor::new(Vec::new());
    thumb_img
        .write_to(&mut thumb, image::ImageFormat::Jpeg)
        .unwrap();
    let thumb = thumb.into_inner();

    let make_field = Field {
        tag: Tag::Make,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![make.as_bytes().to_vec()]),
    };
    let mut writer = exif::experimental::Writer::new();
    writer.push_field(&make_field);
    writer.set_jpeg(&thumb, In::THUMBNAIL);
    let mut buffer = Cursor::new(Vec::new());
    writer.write(&mut buffer, false).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let mut jpeg = Jpeg::from_bytes(bytes.into()).unwrap();
    jpeg.set_exif(Some(buffer.into_inner().into()));
    std::fs::write(&path, jpeg.encoder().bytes()).unwrap();
    (path, thumb)
}

pub fn read_exif(path: &Path) -> exif::Exif {
    let file = std::fs::File::open(path).unwrap();
    let mut bufreader = std::io::BufReader::new(&file);
    exif::Reader::new()
        .read_from_container(&mut bufreader)
        .unwrap()
}

/// Decode a GPS rational triple plus its hemisphere reference back into
/// signed decimal degrees.
pub fn gps_decimal(exif: &exif::Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let coord = exif.get_field(coord_tag, In::PRIMARY)?;
    let reference = exif.get_field(ref_tag, In::PRIMARY)?;

    let Value::Rational(ref triple) = coord.value else {
        return None;
    };
    if triple.len() != 3 {
        return None;
    }
    let mut decimal =
        triple[0].to_f64() + triple[1].to_f64() / 60.0 + triple[2].to_f64() / 3600.0;
    if let Some(letter) = reference.display_value().to_string().chars().next() {
        if letter == 'S' || letter == 'W' {
            decimal = -decimal;
        }
    }
    Some(decimal)
}

/// Settings pointed at a test folder and a local endpoint, with the token
/// the fixture server asserts on.
pub fn test_settings(folder: &Path, graph_url: &str) -> Settings {
    Settings::new(
        folder.to_path_buf(),
        "testtoken".into(),
        graph_url.into(),
        5,
        false,
    )
    .unwrap()
}

/// Serve exactly one HTTP response on an ephemeral local port. Returns the
/// base URL and a handle yielding the raw request head once a request has
/// been answered.
pub fn serve_once(
    status: u16,
    reason: &str,
    body: &str,
) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let reason = reason.to_string();
    let body = body.to_string();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).unwrap();
            head.extend_from_slice(&buf[..n]);
            if n == 0 || head.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&head).into_owned()
    });

    (base_url, handle)
}
