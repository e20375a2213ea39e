//! Archive export: the workbook plus every attachment file it references.
//!
//! Attachments are downloaded one at a time in row order. A failed download
//! is recorded in `missing_files.txt` inside the archive and never aborts the
//! export.

use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::backend::AttachmentSource;
use crate::columns::Entity;
use crate::config::Buckets;
use crate::downloader::{to_xlsx, Sheet};
use crate::error::Result;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._+-]").unwrap();
}

pub const MANIFEST_NAME: &str = "missing_files.txt";

/// How an entity's attachments are laid out in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `<folder>/<owner>_<file>`
    Flat,
    /// `<folder>/<owner>/<file>`
    PerOwner,
}

/// Where an entity keeps its attachment path and owner
#[derive(Debug, Clone, Copy)]
pub struct AttachmentSpec {
    pub path_key: &'static str,
    pub owner_key: &'static str,
    pub folder: &'static str,
    pub layout: Layout,
}

pub fn attachment_spec(entity: Entity) -> Option<AttachmentSpec> {
    match entity {
        Entity::Abstracts => Some(AttachmentSpec {
            path_key: "abstract_file_path",
            owner_key: "email",
            folder: "abstracts",
            layout: Layout::Flat,
        }),
        Entity::PaymentReceipts => Some(AttachmentSpec {
            path_key: "receipt_file_path",
            owner_key: "email",
            folder: "payment_receipts",
            layout: Layout::PerOwner,
        }),
        _ => None,
    }
}

/// Make an owner identifier safe for use in a file name
///
/// `@` becomes `_at_`; anything outside `[A-Za-z0-9._+-]` becomes `_`.
pub fn sanitize_owner(owner: &str) -> String {
    let replaced = owner.replace('@', "_at_");
    UNSAFE_CHARS.replace_all(&replaced, "_").into_owned()
}

// A single path segment that cannot point at or above its parent
fn safe_segment(segment: &str, fallback: &str) -> String {
    match segment {
        "" | "." | ".." => fallback.to_string(),
        _ => segment.to_string(),
    }
}

// Directory prefix (ending in the separator) and file name of an entry
fn entry_parts(spec: &AttachmentSpec, owner: &str, path: &str) -> (String, String) {
    let owner = safe_segment(&sanitize_owner(owner.trim()), "unknown");
    let basename = path
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("");
    let basename = safe_segment(basename, "_");
    match spec.layout {
        Layout::Flat => (format!("{}/{}_", spec.folder, owner), basename),
        Layout::PerOwner => (format!("{}/{}/", spec.folder, owner), basename),
    }
}

/// Archive entry name of one attachment
///
/// Owners and file names of `.` or `..` are replaced, so every entry stays
/// inside its entity folder.
pub fn attachment_entry_name(spec: &AttachmentSpec, owner: &str, path: &str) -> String {
    let (dir, file) = entry_parts(spec, owner, path);
    format!("{dir}{file}")
}

/// Reserve `dir` + `file` in `taken`, suffixing `-2`, `-3`, ... before the
/// file's extension when it is already used
fn unique_name(taken: &mut HashSet<String>, dir: &str, file: &str) -> String {
    let name = format!("{dir}{file}");
    if taken.insert(name.clone()) {
        return name;
    }
    let (stem, ext) = match file.rfind('.') {
        Some(dot) if dot > 0 => file.split_at(dot),
        _ => (file, ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{dir}{stem}-{n}{ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// An attachment that could not be downloaded
#[derive(Debug, Clone, PartialEq)]
pub struct MissingFile {
    pub entity: Entity,
    pub owner: String,
    pub path: String,
    pub reason: String,
}

/// A finished archive
#[derive(Debug)]
pub struct ExportArchive {
    pub bytes: Vec<u8>,
    pub downloaded: usize,
    pub missing: Vec<MissingFile>,
}

fn manifest_text(missing: &[MissingFile]) -> String {
    let mut text = String::from("The following files could not be downloaded:\n\n");
    for file in missing {
        text.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            file.entity, file.owner, file.path, file.reason
        ));
    }
    text
}

/// Build a ZIP holding `workbook_name` (the sheets as XLSX) and the
/// attachments of every sheet whose entity has them
pub async fn build_archive(
    sheets: &[Sheet<'_>],
    workbook_name: &str,
    source: &dyn AttachmentSource,
    buckets: &Buckets,
) -> Result<ExportArchive> {
    let workbook = to_xlsx(sheets)?;

    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut missing = Vec::new();
    let mut taken = HashSet::new();
    taken.insert(workbook_name.to_string());

    for sheet in sheets {
        let (Some(spec), Some(bucket)) = (
            attachment_spec(sheet.entity),
            buckets.for_entity(sheet.entity),
        ) else {
            continue;
        };

        for row in sheet.rows {
            let path = row.get(spec.path_key);
            if path.is_empty() {
                continue;
            }
            let owner = row.get(spec.owner_key);
            match source.fetch_attachment(bucket, path).await {
                Ok(bytes) => {
                    let (dir, file) = entry_parts(&spec, owner, path);
                    let name = unique_name(&mut taken, &dir, &file);
                    files.push((name, bytes));
                }
                Err(err) => {
                    warn!("could not download {bucket}/{path}: {err}");
                    missing.push(MissingFile {
                        entity: sheet.entity,
                        owner: owner.to_string(),
                        path: path.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(workbook_name, options)?;
    zip.write_all(&workbook)?;
    for (name, bytes) in &files {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }
    if !missing.is_empty() {
        zip.start_file(MANIFEST_NAME, options)?;
        zip.write_all(manifest_text(&missing).as_bytes())?;
    }
    let bytes = zip.finish()?.into_inner();

    info!(
        "archive built: {} attachments, {} missing",
        files.len(),
        missing.len()
    );
    Ok(ExportArchive {
        bytes,
        downloaded: files.len(),
        missing,
    })
}
