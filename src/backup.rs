use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const META_WORKSPACE_ENTRY: &str = "meta/workspace.json";
pub const BUNDLE_FORMAT_V1: &str = "resulthub-workspace-v1";

const COLLECTIONS: [&str; 3] = ["students", "teachers", "results"];

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub entries_restored: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn collection_entry(name: &str) -> String {
    format!("data/{}.json", name)
}

/// Bundles the workspace's collection files into a zip with a checksum
/// manifest. A collection that was never written exports as the empty array.
pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    if !workspace_path.is_dir() {
        return Err(anyhow!(
            "workspace not found: {}",
            workspace_path.to_string_lossy()
        ));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let mut payloads: Vec<(String, Vec<u8>)> = Vec::with_capacity(COLLECTIONS.len());
    for name in COLLECTIONS {
        let path = workspace_path.join(format!("{}.json", name));
        let bytes = if path.is_file() {
            std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.to_string_lossy()))?
        } else {
            b"[]".to_vec()
        };
        payloads.push((collection_entry(name), bytes));
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = chrono::Utc::now().timestamp();
    let checksums: serde_json::Map<String, serde_json::Value> = payloads
        .iter()
        .map(|(entry, bytes)| (entry.clone(), json!(sha256_hex(bytes))))
        .collect();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "checksums": checksums,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (entry, bytes) in &payloads {
        zip.start_file(entry.as_str(), opts)
            .with_context(|| format!("failed to start entry {}", entry))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {}", entry))?;
    }

    let workspace_meta = json!({
        "sourceWorkspace": workspace_path.to_string_lossy(),
    });
    zip.start_file(META_WORKSPACE_ENTRY, opts)
        .context("failed to start workspace metadata entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&workspace_meta)
            .context("failed to serialize workspace metadata")?
            .as_bytes(),
    )
    .context("failed to write workspace metadata entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: payloads.len() + 2,
    })
}

/// Restores the collection files from a bundle. Every entry is verified
/// against the manifest checksum before anything replaces the workspace
/// files, and each file lands via a temp file and a rename.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;

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

    let mut restored: Vec<(String, Vec<u8>)> = Vec::with_capacity(COLLECTIONS.len());
    for name in COLLECTIONS {
        let entry_name = collection_entry(name);
        let mut bytes = Vec::new();
        archive
            .by_name(&entry_name)
            .with_context(|| format!("bundle missing {}", entry_name))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read {}", entry_name))?;

        let expected = manifest
            .get("checksums")
            .and_then(|c| c.get(&entry_name))
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("manifest missing checksum for {}", entry_name))?;
        if sha256_hex(&bytes) != expected {
            return Err(anyhow!("checksum mismatch for {}", entry_name));
        }
        restored.push((name.to_string(), bytes));
    }

    for (name, bytes) in &restored {
        let dst = workspace_path.join(format!("{}.json", name));
        let tmp = workspace_path.join(format!("{}.json.importing", name));
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
        std::fs::rename(&tmp, &dst)
            .with_context(|| format!("failed to move {}", dst.to_string_lossy()))?;
    }

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        entries_restored: restored.len(),
    })
}
