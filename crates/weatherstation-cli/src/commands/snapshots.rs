//! `weatherstation snapshots` — inspect snapshot files.

use std::path::Path;

use weatherstation_core::{MeasurementKind, SnapshotWriter};

pub fn run(dir: &str, kind: Option<&str>, json: bool) {
    if !Path::new(dir).is_dir() {
        super::fail(format!("snapshot directory not found: {dir}"));
    }
    let writer = SnapshotWriter::new(dir).unwrap_or_else(|e| super::fail(e));

    match kind {
        None => list(&writer),
        Some(name) => {
            let kind: MeasurementKind = name.parse().unwrap_or_else(|e| super::fail(e));
            show(&writer, kind, json);
        }
    }
}

fn list(writer: &SnapshotWriter) {
    let summaries = writer.list().unwrap_or_else(|e| super::fail(e));
    if summaries.is_empty() {
        println!("No snapshots in {}", writer.dir().display());
        return;
    }

    println!("Snapshots in {}\n", writer.dir().display());
    println!("{:<12} {:>9}  {:<24}", "Kind", "Readings", "Written");
    println!("{}", "-".repeat(48));
    for s in &summaries {
        println!(
            "{:<12} {:>9}  {:<24}",
            s.kind.as_str(),
            s.readings,
            s.written_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
        );
    }
}

fn show(writer: &SnapshotWriter, kind: MeasurementKind, json: bool) {
    let snapshot = match writer.load(kind) {
        Ok(s) => s,
        Err(e) => {
            let dir = writer.dir().display();
            super::fail(format!("no readable {kind} snapshot in {dir}: {e}"))
        }
    };

    if json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(text) => println!("{text}"),
            Err(e) => super::fail(e),
        }
        return;
    }

    println!("{kind} snapshot {}", snapshot.batch_id);
    println!("  Written:  {}", snapshot.written_at.to_rfc3339());
    println!("  Readings: {}", snapshot.readings.len());
    println!();
    for r in &snapshot.readings {
        println!("  {r}");
    }
}
