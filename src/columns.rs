//! Column registry
//!
//! Static, ordered metadata describing every output field of every entity.
//! The order of a column list is significant: it is the table column order in
//! the dashboard and the column order of exported sheets and CSV files.

use lazy_static::lazy_static;
use serde::Serialize;
use std::fmt;

/// Sub-fields of an organizer blob, in flattening order
pub const ORGANIZER_FIELDS: [&str; 5] = ["email", "country", "lastName", "firstName", "affiliation"];

/// Key prefixes of the three organizer blobs carried by a submission
pub const ORGANIZER_PREFIXES: [&str; 3] = [
    "organizer_primary",
    "organizer_secondary",
    "organizer_tertiary",
];

/// One logical entity synced from its own backend table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Submissions,
    Registrations,
    Abstracts,
    PaymentReceipts,
}

impl Entity {
    pub const ALL: [Entity; 4] = [
        Entity::Submissions,
        Entity::Registrations,
        Entity::Abstracts,
        Entity::PaymentReceipts,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "submissions" => Some(Entity::Submissions),
            "registrations" => Some(Entity::Registrations),
            "abstracts" => Some(Entity::Abstracts),
            "payment_receipts" => Some(Entity::PaymentReceipts),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Entity::Submissions => "submissions",
            Entity::Registrations => "registrations",
            Entity::Abstracts => "abstracts",
            Entity::PaymentReceipts => "payment_receipts",
        }
    }

    /// Human-facing title, also used as the worksheet name
    pub fn title(&self) -> &'static str {
        match self {
            Entity::Submissions => "Submissions",
            Entity::Registrations => "Registrations",
            Entity::Abstracts => "Abstracts",
            Entity::PaymentReceipts => "Payment Receipts",
        }
    }

    /// Backend table the entity is synced from
    pub fn table(&self) -> &'static str {
        match self {
            Entity::Submissions => "thematic_sessions_submissions",
            Entity::Registrations => "registrations",
            Entity::Abstracts => "abstracts",
            Entity::PaymentReceipts => "payment_receipts",
        }
    }

    pub fn dataset(&self) -> Dataset {
        match self {
            Entity::Submissions => Dataset::Submissions,
            _ => Dataset::Registrations,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A group of entities synced and exported together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Submissions,
    Registrations,
}

impl Dataset {
    pub const ALL: [Dataset; 2] = [Dataset::Submissions, Dataset::Registrations];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "submissions" => Some(Dataset::Submissions),
            "registrations" => Some(Dataset::Registrations),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Submissions => "submissions",
            Dataset::Registrations => "registrations",
        }
    }

    /// Member entities, in tab and sheet order
    pub fn entities(&self) -> &'static [Entity] {
        match self {
            Dataset::Submissions => &[Entity::Submissions],
            Dataset::Registrations => &[
                Entity::Registrations,
                Entity::Abstracts,
                Entity::PaymentReceipts,
            ],
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a column may be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Both,
    UiOnly,
    ExportOnly,
}

/// Consumption context of a column list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Ui,
    Export,
}

impl Visibility {
    pub fn includes(&self, surface: Surface) -> bool {
        match (self, surface) {
            (Visibility::Both, _) => true,
            (Visibility::UiOnly, Surface::Ui) => true,
            (Visibility::ExportOnly, Surface::Export) => true,
            _ => false,
        }
    }
}

/// Metadata for one output field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    /// Long text that may wrap in the table and in exported sheets
    pub wrap: bool,
    pub visibility: Visibility,
}

impl ColumnDef {
    fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        ColumnDef {
            key: key.into(),
            label: label.into(),
            wrap: false,
            visibility: Visibility::Both,
        }
    }

    fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }

    fn ui_only(mut self) -> Self {
        self.visibility = Visibility::UiOnly;
        self
    }

    fn export_only(mut self) -> Self {
        self.visibility = Visibility::ExportOnly;
        self
    }
}

fn organizer_label(prefix: &str, field: &str) -> String {
    let rank = match prefix {
        "organizer_primary" => "Primary",
        "organizer_secondary" => "Secondary",
        _ => "Tertiary",
    };
    let field = match field {
        "email" => "Email",
        "country" => "Country",
        "lastName" => "Last Name",
        "firstName" => "First Name",
        _ => "Affiliation",
    };
    format!("{rank} Organizer {field}")
}

fn submission_columns() -> Vec<ColumnDef> {
    let mut cols = vec![
        ColumnDef::new("id", "ID").export_only(),
        ColumnDef::new("created_at", "Submitted At"),
        ColumnDef::new("session_title", "Session Title").wrap(),
        ColumnDef::new("topic", "Topic"),
        ColumnDef::new("keywords", "Keywords").wrap(),
        ColumnDef::new("description", "Description").wrap().export_only(),
        ColumnDef::new("organizers", "Organizers").wrap().ui_only(),
    ];
    for prefix in ORGANIZER_PREFIXES {
        for field in ORGANIZER_FIELDS {
            let col = ColumnDef::new(format!("{prefix}_{field}"), organizer_label(prefix, field));
            // The table only has room for the primary organizer; the rest
            // are summarised by the `organizers` column.
            cols.push(if prefix == "organizer_primary" {
                col
            } else {
                col.export_only()
            });
        }
    }
    cols.push(ColumnDef::new("consent", "Consent"));
    cols
}

fn registration_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id", "ID"),
        ColumnDef::new("created_at", "Registered At"),
        ColumnDef::new("first_name", "First Name"),
        ColumnDef::new("last_name", "Last Name"),
        ColumnDef::new("email", "Email"),
        ColumnDef::new("affiliation", "Affiliation"),
        ColumnDef::new("country", "Country"),
        ColumnDef::new("registration_type", "Registration Type"),
        ColumnDef::new("payment_confirmed", "Payment Confirmed"),
        ColumnDef::new("dietary_requirements", "Dietary Requirements").wrap(),
        ColumnDef::new("notes", "Notes").wrap(),
    ]
}

fn abstract_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id", "ID").export_only(),
        ColumnDef::new("created_at", "Submitted At"),
        ColumnDef::new("email", "Email"),
        ColumnDef::new("first_name", "First Name"),
        ColumnDef::new("last_name", "Last Name"),
        ColumnDef::new("title", "Title").wrap(),
        ColumnDef::new("authors", "Authors").wrap(),
        ColumnDef::new("keywords", "Keywords").wrap(),
        ColumnDef::new("presentation_type", "Presentation Type"),
        ColumnDef::new("session", "Session"),
        ColumnDef::new("abstract_file", "Abstract File"),
        ColumnDef::new("abstract_file_path", "Abstract File Path").export_only(),
    ]
}

fn payment_receipt_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id", "ID").export_only(),
        ColumnDef::new("created_at", "Uploaded At"),
        ColumnDef::new("email", "Email"),
        ColumnDef::new("first_name", "First Name"),
        ColumnDef::new("last_name", "Last Name"),
        ColumnDef::new("amount", "Amount"),
        ColumnDef::new("currency", "Currency"),
        ColumnDef::new("payment_method", "Payment Method"),
        ColumnDef::new("receipt_file", "Receipt File"),
        ColumnDef::new("receipt_file_path", "Receipt File Path").export_only(),
    ]
}

lazy_static! {
    static ref SUBMISSION_COLUMNS: Vec<ColumnDef> = submission_columns();
    static ref REGISTRATION_COLUMNS: Vec<ColumnDef> = registration_columns();
    static ref ABSTRACT_COLUMNS: Vec<ColumnDef> = abstract_columns();
    static ref PAYMENT_RECEIPT_COLUMNS: Vec<ColumnDef> = payment_receipt_columns();
}

/// Full ordered column list of an entity
pub fn columns(entity: Entity) -> &'static [ColumnDef] {
    match entity {
        Entity::Submissions => &SUBMISSION_COLUMNS,
        Entity::Registrations => &REGISTRATION_COLUMNS,
        Entity::Abstracts => &ABSTRACT_COLUMNS,
        Entity::PaymentReceipts => &PAYMENT_RECEIPT_COLUMNS,
    }
}

/// Columns of `entity` visible on `surface`, in registry order
pub fn columns_for(entity: Entity, surface: Surface) -> Vec<&'static ColumnDef> {
    columns(entity)
        .iter()
        .filter(|col| col.visibility.includes(surface))
        .collect()
}

/// Same as [`columns_for`], keyed by entity name. Unknown names yield no columns.
pub fn columns_for_name(name: &str, surface: Surface) -> Vec<&'static ColumnDef> {
    match Entity::from_name(name) {
        Some(entity) => columns_for(entity, surface),
        None => Vec::new(),
    }
}
