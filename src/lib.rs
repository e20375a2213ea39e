/*!
# Conference Dashboard

A self-hosted dashboard for conference organisers, built in Rust.

## Overview

The dashboard syncs rows from a hosted relational backend (a Supabase-style
PostgREST API), flattens nested JSON fields into display-ready records,
renders them as HTML tables across several tabs, and exports the results as
Excel workbooks, CSV files and ZIP archives that bundle the attachment files
kept in the backend's object storage.

## Architecture

### Data pipeline
- **Column Registry** (`columns`) - Ordered column metadata per entity: key,
  label, wrap flag and whether the column shows in the table, the export, or
  both
- **Coercion helpers** (`coerce`) - The single decoding layer from loosely
  typed JSON values to display strings
- **Row Normalizer** (`normalize`) - Total functions mapping one raw row to
  one flat record; malformed input degrades to empty strings

### Around the pipeline
- **Backend** (`backend`) - Table queries and attachment downloads behind
  two async traits, with an HTTP implementation
- **State** (`state`) - Rows per entity, active tab and status line; the sync
  operation that fills it
- **Rendering** (`render`) - Handlebars page built from flat records and UI
  columns
- **Exports** (`downloader`, `archive`) - CSV, XLSX and ZIP output
- **Verification** (`loader`, `verify`) - Checks a CSV whose organizer blob
  was split into columns against the original

## Entities

| Entity | Table | Dataset |
|---|---|---|
| submissions | thematic_sessions_submissions | submissions |
| registrations | registrations | registrations |
| abstracts | abstracts | registrations |
| payment_receipts | payment_receipts | registrations |

## HTTP Endpoints

- `/` - Dashboard page
- `/tab/{entity}` - Switch the active tab
- `/sync/{dataset}` - Fetch and normalize a dataset
- `/api/rows/{entity}` - Rows and UI columns as JSON
- `/export/{dataset}/xlsx`, `/export/{entity}/csv`, `/export/{dataset}/zip` - Downloads
*/

pub mod archive;
pub mod backend;
pub mod coerce;
pub mod columns;
pub mod config;
pub mod downloader;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod state;
pub mod verify;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod render;

/// Re-export the most used items to make them easier to reach
pub use columns::{columns, columns_for, columns_for_name, ColumnDef, Dataset, Entity, Surface, Visibility};
pub use config::Config;
pub use error::{DashboardError, Result};
pub use normalize::{normalize, normalize_all, FlatRecord, RawRecord};
pub use state::DashboardState;
