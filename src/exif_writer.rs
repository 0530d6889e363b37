use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{anyhow, Context as _, Result};
use exif::experimental::Writer;
use exif::{Context, Field, In, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::ImageEXIF;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::gps::{latitude_ref, longitude_ref, to_dms};

/// EXIF payload split into its sections, each independently empty or
/// populated. A file without EXIF maps to the all-empty record.
#[derive(Debug, Default)]
pub struct MetadataSections {
    /// 0th IFD (camera make/model, orientation, ...).
    pub primary: Vec<Field>,
    /// Exif IFD (capture settings).
    pub exif: Vec<Field>,
    /// GPS IFD.
    pub gps: Vec<Field>,
    /// 1st IFD, minus the thumbnail offset/length fields the encoder
    /// regenerates.
    pub thumbnail_ifd: Vec<Field>,
    /// Embedded thumbnail JPEG, if the 1st IFD carried one.
    pub thumbnail: Option<Vec<u8>>,
}

impl MetadataSections {
    /// Partition a raw EXIF payload (TIFF bytes, no `Exif\0\0` header)
    /// into sections.
    fn from_raw(raw: Vec<u8>) -> Result<Self> {
        let exif = exif::Reader::new()
            .read_raw(raw)
            .context("Failed to parse existing EXIF payload")?;

        let mut sections = Self::default();
        sections.thumbnail = extract_thumbnail(&exif);

        for field in exif.fields() {
            // The encoder recomputes the thumbnail offset/length, so the
            // stale values must not be carried over.
            if field.tag == Tag::JPEGInterchangeFormat
                || field.tag == Tag::JPEGInterchangeFormatLength
            {
                continue;
            }
            let owned = Field {
                tag: field.tag,
                ifd_num: field.ifd_num,
                value: field.value.clone(),
            };
            if field.ifd_num == In::THUMBNAIL {
                sections.thumbnail_ifd.push(owned);
                continue;
            }
            match field.tag.context() {
                Context::Tiff => sections.primary.push(owned),
                Context::Exif => sections.exif.push(owned),
                Context::Gps => sections.gps.push(owned),
                // No camera GPS workflow depends on Interop, and the
                // typed record has no slot for it.
                _ => debug!("Dropping field {} outside the known sections", field.tag),
            }
        }
        Ok(sections)
    }

    /// Re-encode the record as big-endian TIFF, ready for the JPEG APP1
    /// segment.
    fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        let fields = self
            .primary
            .iter()
            .chain(&self.exif)
            .chain(&self.gps)
            .chain(&self.thumbnail_ifd);
        for field in fields {
            writer.push_field(field);
        }
        if let Some(thumbnail) = &self.thumbnail {
            writer.set_jpeg(thumbnail, In::THUMBNAIL);
        }

        let mut buffer = Cursor::new(Vec::new());
        writer
            .write(&mut buffer, false)
            .map_err(|e| anyhow!("Failed to encode EXIF payload: {}", e))?;
        Ok(buffer.into_inner())
    }
}

/// Build the four GPS IFD fields for a signed coordinate pair. The sign
/// lands in the reference letter; the DMS triples hold magnitudes only.
fn gps_fields(lat: f64, lon: f64) -> Vec<Field> {
    vec![
        Field {
            tag: Tag::GPSLatitudeRef,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![latitude_ref(lat).as_bytes().to_vec()]),
        },
        Field {
            tag: Tag::GPSLatitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(to_dms(lat.abs()).to_vec()),
        },
        Field {
            tag: Tag::GPSLongitudeRef,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![longitude_ref(lon).as_bytes().to_vec()]),
        },
        Field {
            tag: Tag::GPSLongitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(to_dms(lon.abs()).to_vec()),
        },
    ]
}

/// Replace the GPS section of a JPEG's EXIF with the given coordinates
/// and rewrite the file in place.
///
/// Existing non-GPS sections (and the embedded thumbnail) are preserved;
/// a file without EXIF gets a fresh payload whose only populated section
/// is GPS. Pixel data is never re-encoded. The rewrite goes through a
/// temp file in the same directory followed by a rename, so any failure
/// leaves the original untouched.
pub fn write_gps_location(path: &Path, lat: f64, lon: f64) -> Result<()> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut jpeg = Jpeg::from_bytes(bytes.into())
        .with_context(|| format!("{} is not a valid JPEG", path.display()))?;

    let mut sections = match jpeg.exif() {
        Some(raw) => MetadataSections::from_raw(raw.to_vec())?,
        None => MetadataSections::default(),
    };
    sections.gps = gps_fields(lat, lon);

    jpeg.set_exif(Some(sections.encode()?.into()));
    replace_file(path, &jpeg.encoder().bytes())
}

/// Embedded thumbnail bytes, located through the 1st IFD offset/length
/// fields relative to the TIFF buffer.
fn extract_thumbnail(exif: &exif::Exif) -> Option<Vec<u8>> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let length = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    exif.buf().get(offset..offset + length).map(<[u8]>::to_vec)
}

/// Atomically replace `path` with `bytes`: write a sibling temp file,
/// copy the original permissions, rename over the original. The temp
/// file is removed on every failure path.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut temp = NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
        .context("Failed to create temporary file")?;
    temp.write_all(bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let permissions = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .permissions();
    temp.as_file().set_permissions(permissions)?;

    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
