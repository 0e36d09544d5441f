//! xlsx package access: worksheet part lookup and part replacement

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::Event;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;
    ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Not an xlsx package: {}", path.display()))
}

fn read_archive_part<R: Read + Seek>(archive: &mut ZipArchive<R>, part: &str) -> Result<Vec<u8>> {
    let mut file = archive
        .by_name(part)
        .with_context(|| format!("Missing package part: {}", part))?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read package part: {}", part))?;
    Ok(bytes)
}

/// Raw bytes of one package part
pub(super) fn read_part(path: &Path, part: &str) -> Result<Vec<u8>> {
    let mut archive = open_archive(path)?;
    read_archive_part(&mut archive, part)
}

/// Worksheet part path (e.g. `xl/worksheets/sheet2.xml`) for every sheet name
pub(super) fn sheet_parts(path: &Path) -> Result<HashMap<String, String>> {
    let mut archive = open_archive(path)?;
    let workbook = read_archive_part(&mut archive, WORKBOOK_PART)?;
    let rels = read_archive_part(&mut archive, WORKBOOK_RELS_PART)?;

    let targets = worksheet_targets(&rels)?;
    let parts = sheet_rel_ids(&workbook)?
        .into_iter()
        .filter_map(|(name, rel_id)| targets.get(&rel_id).map(|target| (name, target.clone())))
        .collect();
    Ok(parts)
}

/// (sheet name, relationship id) from workbook.xml, in workbook order
fn sheet_rel_ids(xml: &[u8]) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(attr.decode_and_unescape_value(e.decoder())?.into_owned()),
                        b"id" => rel_id = Some(attr.decode_and_unescape_value(e.decoder())?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push((name, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Relationship id -> package path, worksheet relationships only
fn worksheet_targets(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut targets = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                let mut is_worksheet = false;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => id = Some(attr.decode_and_unescape_value(e.decoder())?.into_owned()),
                        b"Target" => target = Some(attr.decode_and_unescape_value(e.decoder())?.into_owned()),
                        b"Type" => is_worksheet = attr.decode_and_unescape_value(e.decoder())?.ends_with("/worksheet"),
                        _ => {}
                    }
                }
                if let (true, Some(id), Some(target)) = (is_worksheet, id, target) {
                    // Targets are relative to xl/ unless absolute
                    let path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{}", target),
                    };
                    targets.insert(id, path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(targets)
}

/// Rewrite the package at `path` with some parts replaced.
///
/// Every other entry is copied without recompression. The new package is
/// written next to the original and renamed over it.
pub(super) fn replace_parts(path: &Path, replacements: &HashMap<String, Vec<u8>>) -> Result<()> {
    let mut archive = open_archive(path)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let mut zip = ZipWriter::new(tmp);
    let mut replaced = 0;

    for idx in 0..archive.len() {
        let entry = archive.by_index_raw(idx)?;
        match replacements.get(entry.name()) {
            Some(bytes) => {
                let name = entry.name().to_string();
                drop(entry);
                let options =
                    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                zip.start_file(name, options)?;
                zip.write_all(bytes)?;
                replaced += 1;
            }
            None => zip.raw_copy_file(entry)?,
        }
    }

    if replaced != replacements.len() {
        bail!(
            "Only {} of {} parts to replace exist in {}",
            replaced,
            replacements.len(),
            path.display()
        );
    }

    let tmp = zip.finish()?;
    drop(archive);
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;
    Ok(())
}
