use crate::bulletin::ClassRun;
use anyhow::{anyhow, Context};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const STATISTICS_ENTRY: &str = "statistics.json";
pub const BUNDLE_FORMAT_V1: &str = "bulletind-class-bundle-v1";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub bundle_format: String,
    pub bundle_id: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySummary {
    pub bundle_format: String,
    pub bundle_id: String,
    pub entry_count: usize,
    pub valid: bool,
    pub mismatches: Vec<String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn entry_name(idx: usize, key: &str) -> String {
    let safe: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("bulletins/{:03}-{}.json", idx + 1, safe)
}

/// Writes every bulletin of a class run, the class statistics and a manifest
/// carrying a SHA-256 digest per entry.
pub fn export_class_bundle(run: &ClassRun<'_>, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let bulletins = run
        .bulletins()
        .map_err(|e| anyhow!("failed to assemble bulletins: {}", e))?;

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(bulletins.len() + 1);
    let statistics = json!({
        "class": run.class_summary(),
        "policy": run.policy(),
        "statistics": run.statistics(),
        "ranking": run.ranking(),
    });
    entries.push((
        STATISTICS_ENTRY.to_string(),
        serde_json::to_vec_pretty(&statistics).context("failed to serialize statistics")?,
    ));
    for (idx, b) in bulletins.iter().enumerate() {
        let key = if b.student.matricule.trim().is_empty() {
            &b.student.id
        } else {
            &b.student.matricule
        };
        entries.push((
            entry_name(idx, key),
            serde_json::to_vec_pretty(b).context("failed to serialize bulletin")?,
        ));
    }

    let mut digests = Vec::with_capacity(entries.len());
    for (name, bytes) in &entries {
        zip.start_file(name.as_str(), opts)
            .with_context(|| format!("failed to start entry {}", name))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {}", name))?;
        digests.push(json!({ "path": name, "sha256": sha256_hex(bytes) }));
    }

    let bundle_id = Uuid::new_v4().to_string();
    let class = run.class_summary();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "bundleId": bundle_id,
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "classId": class.id,
        "period": run.period(),
        "entries": digests,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;
    zip.finish().context("failed to finalize zip bundle")?;

    tracing::info!(
        class = %class.id,
        entries = entries.len(),
        path = %out_path.to_string_lossy(),
        "exported class bundle"
    );

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        bundle_id,
        entry_count: entries.len() + 1,
    })
}

pub fn verify_class_bundle(in_path: &Path) -> anyhow::Result<VerifySummary> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let bundle_id = manifest
        .get("bundleId")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let listed = manifest
        .get("entries")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let mut mismatches = Vec::new();
    if listed.is_empty() {
        mismatches.push("manifest lists no entries".to_string());
    }
    let mut seen: HashSet<String> = HashSet::new();
    for e in &listed {
        let (Some(path), Some(expected)) = (
            e.get("path").and_then(|v| v.as_str()),
            e.get("sha256").and_then(|v| v.as_str()),
        ) else {
            mismatches.push("manifest entry without path or sha256".to_string());
            continue;
        };
        seen.insert(path.to_string());
        let mut bytes = Vec::new();
        match archive.by_name(path) {
            Ok(mut f) => {
                f.read_to_end(&mut bytes)
                    .with_context(|| format!("failed to read entry {}", path))?;
            }
            Err(_) => {
                mismatches.push(format!("{}: missing", path));
                continue;
            }
        }
        if sha256_hex(&bytes) != expected {
            mismatches.push(format!("{}: digest mismatch", path));
        }
    }

    let mut unlisted: Vec<&str> = archive
        .file_names()
        .filter(|name| *name != MANIFEST_ENTRY && !name.ends_with('/') && !seen.contains(*name))
        .collect();
    unlisted.sort_unstable();
    for name in unlisted {
        mismatches.push(format!("{}: not in manifest", name));
    }

    Ok(VerifySummary {
        bundle_format: format.to_string(),
        bundle_id,
        entry_count: listed.len(),
        valid: mismatches.is_empty(),
        mismatches,
    })
}
