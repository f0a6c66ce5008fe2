//! Yarn classic adapter
//!
//! `yarn outdated --json` prints newline-delimited JSON events. The outdated
//! packages live in the single `{"type": "table"}` event:
//!
//! ```text
//! {"type":"info","data":"Color legend: ..."}
//! {"type":"table","data":{"head":["Package","Current","Wanted","Latest","Package Type","URL"],
//!   "body":[["lodash","4.17.20","4.17.21","4.17.21","dependencies","https://..."]]}}
//! ```

use super::{parse_keyed_report, PackageManager};
use crate::command::CommandLine;
use crate::domain::{OutdatedPackage, PackageManagerKind};
use serde::Deserialize;

/// Yarn adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct Yarn;

/// One line of yarn's JSON event stream
#[derive(Debug, Deserialize)]
struct YarnEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct YarnTable {
    #[serde(default)]
    head: Vec<String>,
    body: Vec<Vec<String>>,
}

/// Column positions inside a table row
struct Columns {
    name: usize,
    current: usize,
    wanted: usize,
    latest: usize,
}

impl Columns {
    fn from_head(head: &[String]) -> Self {
        let find = |label: &str, default: usize| {
            head.iter()
                .position(|h| h.eq_ignore_ascii_case(label))
                .unwrap_or(default)
        };
        Self {
            name: find("Package", 0),
            current: find("Current", 1),
            wanted: find("Wanted", 2),
            latest: find("Latest", 3),
        }
    }
}

fn cell(row: &[String], index: usize) -> Option<String> {
    row.get(index)
        .filter(|value| !value.is_empty() && value.as_str() != "exotic")
        .cloned()
}

impl Yarn {
    fn parse_event_stream(payload: &str) -> Result<Vec<OutdatedPackage>, String> {
        let mut packages = Vec::new();

        for (number, line) in payload.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event: YarnEvent = serde_json::from_str(line)
                .map_err(|e| format!("line {}: {}", number + 1, e))?;
            if event.kind != "table" {
                continue;
            }

            let table: YarnTable = serde_json::from_value(event.data)
                .map_err(|e| format!("line {}: {}", number + 1, e))?;
            let columns = Columns::from_head(&table.head);
            for row in table.body {
                let Some(name) = cell(&row, columns.name) else {
                    continue;
                };
                packages.push(OutdatedPackage::new(name).with_versions(
                    cell(&row, columns.current),
                    cell(&row, columns.wanted),
                    cell(&row, columns.latest),
                ));
            }
        }

        Ok(packages)
    }
}

impl PackageManager for Yarn {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Yarn
    }

    fn query_outdated(&self) -> CommandLine {
        CommandLine::new("yarn").args(["outdated", "--json"])
    }

    /// `yarn add` would move dev dependencies into `dependencies`;
    /// `yarn upgrade --latest` keeps the package where it is declared.
    fn install_latest(&self, package: &str) -> CommandLine {
        CommandLine::new("yarn").args(["upgrade", package, "--latest"])
    }

    fn parse_outdated(&self, payload: &str) -> Result<Vec<OutdatedPackage>, String> {
        if payload.trim_start().starts_with('[') {
            return parse_keyed_report(payload);
        }
        Self::parse_event_stream(payload)
    }
}
