use async_trait::async_trait;
use conference_dashboard::archive::{
    attachment_entry_name, attachment_spec, build_archive, sanitize_owner, MANIFEST_NAME,
};
use conference_dashboard::backend::AttachmentSource;
use conference_dashboard::config::Buckets;
use conference_dashboard::downloader::Sheet;
use conference_dashboard::{normalize_all, DashboardError, Entity, FlatRecord, RawRecord, Result};
use serde_json::json;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Mutex;

/// Serves files from memory and remembers the order of requests
struct FakeStorage {
    files: HashMap<(String, String), Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeStorage {
    fn new(files: &[(&str, &str, &[u8])]) -> Self {
        FakeStorage {
            files: files
                .iter()
                .map(|(bucket, path, bytes)| ((bucket.to_string(), path.to_string()), bytes.to_vec()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AttachmentSource for FakeStorage {
    async fn fetch_attachment(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(format!("{bucket}/{path}"));
        self.files
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| DashboardError::Backend("Object not found".to_string()))
    }
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    out
}

fn abstracts() -> Vec<FlatRecord> {
    let raws: Vec<RawRecord> = vec![
        json!({"email": "ana.silva@uni.pt", "abstract_file_path": "abstracts/11-tides.pdf"}).into(),
        json!({"email": "bo@uni.se", "abstract_file_path": ""}).into(),
        json!({"email": "cy@uni.cl", "abstract_file_path": "abstracts/22-gone.pdf"}).into(),
        json!({"email": "dee o'neil@x.org", "abstract_file_path": "abstracts/33-waves.pdf"}).into(),
    ];
    normalize_all(Entity::Abstracts, &raws)
}

fn receipts() -> Vec<FlatRecord> {
    let raws: Vec<RawRecord> = vec![
        json!({"email": "ana.silva@uni.pt", "receipt_file_path": "receipts/ana/scan.jpg"}).into(),
        json!({"email": "", "receipt_file_path": "receipts/anon/proof.pdf"}).into(),
    ];
    normalize_all(Entity::PaymentReceipts, &raws)
}

#[test]
fn test_sanitize_owner() {
    assert_eq!(sanitize_owner("ana.silva@uni.pt"), "ana.silva_at_uni.pt");
    assert_eq!(sanitize_owner("dee o'neil@x.org"), "dee_o_neil_at_x.org");
    assert_eq!(sanitize_owner("a+b-c_d@e"), "a+b-c_d_at_e");
    assert_eq!(sanitize_owner("josé@ü.de"), "jos__at__.de");
}

#[test]
fn test_entry_names_follow_layout() {
    let flat = attachment_spec(Entity::Abstracts).unwrap();
    assert_eq!(
        attachment_entry_name(&flat, "ana@uni.pt", "abstracts/11-tides.pdf"),
        "abstracts/ana_at_uni.pt_11-tides.pdf"
    );
    let nested = attachment_spec(Entity::PaymentReceipts).unwrap();
    assert_eq!(
        attachment_entry_name(&nested, "ana@uni.pt", "receipts/ana/scan.jpg"),
        "payment_receipts/ana_at_uni.pt/scan.jpg"
    );
    assert_eq!(
        attachment_entry_name(&nested, "", "receipts/x.pdf"),
        "payment_receipts/unknown/x.pdf"
    );
    assert!(attachment_spec(Entity::Registrations).is_none());
}

#[test]
fn test_entry_names_stay_inside_their_folder() {
    let nested = attachment_spec(Entity::PaymentReceipts).unwrap();
    assert_eq!(
        attachment_entry_name(&nested, "..", "receipts/x/scan.jpg"),
        "payment_receipts/unknown/scan.jpg"
    );
    assert_eq!(
        attachment_entry_name(&nested, ".", "receipts/x/scan.jpg"),
        "payment_receipts/unknown/scan.jpg"
    );
    assert_eq!(
        attachment_entry_name(&nested, "ana@uni.pt", "receipts/.."),
        "payment_receipts/ana_at_uni.pt/_"
    );
    assert_eq!(
        attachment_entry_name(&nested, "ana@uni.pt", "../../"),
        "payment_receipts/ana_at_uni.pt/_"
    );
    let flat = attachment_spec(Entity::Abstracts).unwrap();
    assert_eq!(
        attachment_entry_name(&flat, "..", "abstracts/talk.pdf"),
        "abstracts/unknown_talk.pdf"
    );
}

#[tokio::test]
async fn test_archive_bundles_workbook_and_files() {
    let storage = FakeStorage::new(&[
        ("abstracts", "abstracts/11-tides.pdf", b"tides".as_slice()),
        ("abstracts", "abstracts/33-waves.pdf", b"waves".as_slice()),
        ("payment-receipts", "receipts/ana/scan.jpg", b"jpg".as_slice()),
        ("payment-receipts", "receipts/anon/proof.pdf", b"pdf".as_slice()),
    ]);
    let regs: Vec<FlatRecord> = Vec::new();
    let abstracts = abstracts();
    let receipts = receipts();
    let sheets = [
        Sheet { entity: Entity::Registrations, rows: &regs },
        Sheet { entity: Entity::Abstracts, rows: &abstracts },
        Sheet { entity: Entity::PaymentReceipts, rows: &receipts },
    ];

    let archive = build_archive(&sheets, "registrations.xlsx", &storage, &Buckets::default())
        .await
        .unwrap();

    assert_eq!(archive.downloaded, 4);
    assert_eq!(archive.missing.len(), 1);
    assert_eq!(archive.missing[0].path, "abstracts/22-gone.pdf");
    assert_eq!(archive.missing[0].owner, "cy@uni.cl");
    assert!(archive.missing[0].reason.contains("Object not found"));

    assert_eq!(
        entry_names(&archive.bytes),
        vec![
            "registrations.xlsx",
            "abstracts/ana.silva_at_uni.pt_11-tides.pdf",
            "abstracts/dee_o_neil_at_x.org_33-waves.pdf",
            "payment_receipts/ana.silva_at_uni.pt/scan.jpg",
            "payment_receipts/unknown/proof.pdf",
            MANIFEST_NAME,
        ]
    );
    assert_eq!(read_entry(&archive.bytes, "abstracts/ana.silva_at_uni.pt_11-tides.pdf"), b"tides".as_slice());

    let manifest = String::from_utf8(read_entry(&archive.bytes, MANIFEST_NAME)).unwrap();
    assert!(manifest.contains("abstracts/22-gone.pdf"));
    assert!(!manifest.contains("11-tides"));

    // downloads happen in row order, empty paths are never requested
    let requests = storage.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![
            "abstracts/abstracts/11-tides.pdf",
            "abstracts/abstracts/22-gone.pdf",
            "abstracts/abstracts/33-waves.pdf",
            "payment-receipts/receipts/ana/scan.jpg",
            "payment-receipts/receipts/anon/proof.pdf",
        ]
    );
}

#[tokio::test]
async fn test_archive_without_failures_has_no_manifest() {
    let storage = FakeStorage::new(&[]);
    let regs = normalize_all(Entity::Registrations, &[json!({"email": "a@b.c"}).into()]);
    let sheets = [Sheet { entity: Entity::Registrations, rows: &regs }];

    let archive = build_archive(&sheets, "registrations.xlsx", &storage, &Buckets::default())
        .await
        .unwrap();

    assert!(archive.missing.is_empty());
    assert_eq!(entry_names(&archive.bytes), vec!["registrations.xlsx"]);
}

#[tokio::test]
async fn test_duplicate_entry_names_get_suffixes() {
    let storage = FakeStorage::new(&[
        ("abstracts", "abstracts/a/talk.pdf", b"1".as_slice()),
        ("abstracts", "abstracts/b/talk.pdf", b"2".as_slice()),
    ]);
    let raws: Vec<RawRecord> = vec![
        json!({"email": "x@y.z", "abstract_file_path": "abstracts/a/talk.pdf"}).into(),
        json!({"email": "x@y.z", "abstract_file_path": "abstracts/b/talk.pdf"}).into(),
    ];
    let rows = normalize_all(Entity::Abstracts, &raws);
    let sheets = [Sheet { entity: Entity::Abstracts, rows: &rows }];

    let archive = build_archive(&sheets, "registrations.xlsx", &storage, &Buckets::default())
        .await
        .unwrap();

    let names = entry_names(&archive.bytes);
    assert!(names.contains(&"abstracts/x_at_y.z_talk.pdf".to_string()));
    assert!(names.contains(&"abstracts/x_at_y.z_talk-2.pdf".to_string()));
    assert_eq!(read_entry(&archive.bytes, "abstracts/x_at_y.z_talk-2.pdf"), b"2".as_slice());
}

#[tokio::test]
async fn test_duplicate_suffix_lands_on_the_file_name() {
    let storage = FakeStorage::new(&[
        ("abstracts", "abstracts/a/talk", b"1".as_slice()),
        ("abstracts", "abstracts/b/talk", b"2".as_slice()),
    ]);
    let raws: Vec<RawRecord> = vec![
        json!({"email": "x@y.z", "abstract_file_path": "abstracts/a/talk"}).into(),
        json!({"email": "x@y.z", "abstract_file_path": "abstracts/b/talk"}).into(),
    ];
    let rows = normalize_all(Entity::Abstracts, &raws);
    let sheets = [Sheet { entity: Entity::Abstracts, rows: &rows }];

    let archive = build_archive(&sheets, "registrations.xlsx", &storage, &Buckets::default())
        .await
        .unwrap();

    let names = entry_names(&archive.bytes);
    assert!(names.contains(&"abstracts/x_at_y.z_talk".to_string()));
    assert!(names.contains(&"abstracts/x_at_y.z_talk-2".to_string()));
    assert_eq!(read_entry(&archive.bytes, "abstracts/x_at_y.z_talk-2"), b"2".as_slice());
}
