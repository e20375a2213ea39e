//! HTML rendering of the dashboard page.
//!
//! Consumes only flat records and column definitions; it never looks at raw
//! backend data.

use handlebars::Handlebars;
use serde::Serialize;

use crate::archive::attachment_spec;
use crate::columns::{columns_for, Dataset, Entity, Surface};
use crate::error::Result;
use crate::normalize::FlatRecord;
use crate::state::DashboardState;

const DASHBOARD_TEMPLATE: &str = "dashboard";

#[derive(Debug, Serialize)]
pub struct HeaderView {
    pub label: String,
    pub wrap: bool,
}

#[derive(Debug, Serialize)]
pub struct CellView {
    pub text: String,
    pub wrap: bool,
}

/// One entity's rows laid out along its UI columns
#[derive(Debug, Serialize)]
pub struct TableView {
    pub entity: Entity,
    pub title: String,
    pub columns: Vec<HeaderView>,
    pub rows: Vec<Vec<CellView>>,
}

#[derive(Debug, Serialize)]
struct TabView {
    name: &'static str,
    title: &'static str,
    active: bool,
    count: usize,
}

#[derive(Debug, Serialize)]
struct DatasetView {
    name: &'static str,
    title: String,
    has_rows: bool,
    has_attachments: bool,
}

#[derive(Debug, Serialize)]
struct PageView {
    status: String,
    last_synced: Option<String>,
    datasets: Vec<DatasetView>,
    tabs: Vec<TabView>,
    table: TableView,
}

pub fn table_view(entity: Entity, rows: &[FlatRecord]) -> TableView {
    let cols = columns_for(entity, Surface::Ui);
    TableView {
        entity,
        title: entity.title().to_string(),
        columns: cols
            .iter()
            .map(|col| HeaderView {
                label: col.label.clone(),
                wrap: col.wrap,
            })
            .collect(),
        rows: rows
            .iter()
            .map(|row| {
                cols.iter()
                    .map(|col| CellView {
                        text: row.get(&col.key).to_string(),
                        wrap: col.wrap,
                    })
                    .collect()
            })
            .collect(),
    }
}

/// Template registry for the dashboard page
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_template_string(
            DASHBOARD_TEMPLATE,
            include_str!("./static/dashboard.hbs"),
        )?;
        Ok(Self { registry })
    }

    /// Render the whole page for the current state
    pub fn render_dashboard(&self, state: &DashboardState) -> Result<String> {
        let active = state.active_tab();
        let page = PageView {
            status: state.status().to_string(),
            last_synced: state
                .last_synced()
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
            datasets: Dataset::ALL
                .iter()
                .map(|dataset| DatasetView {
                    name: dataset.name(),
                    title: dataset_title(*dataset),
                    has_rows: state.has_rows(*dataset),
                    has_attachments: dataset
                        .entities()
                        .iter()
                        .any(|entity| attachment_spec(*entity).is_some()),
                })
                .collect(),
            tabs: Entity::ALL
                .iter()
                .map(|entity| TabView {
                    name: entity.name(),
                    title: entity.title(),
                    active: *entity == active,
                    count: state.rows(*entity).len(),
                })
                .collect(),
            table: table_view(active, state.rows(active)),
        };
        Ok(self.registry.render(DASHBOARD_TEMPLATE, &page)?)
    }
}

fn dataset_title(dataset: Dataset) -> String {
    match dataset {
        Dataset::Submissions => "Submissions".to_string(),
        Dataset::Registrations => "Registrations".to_string(),
    }
}
