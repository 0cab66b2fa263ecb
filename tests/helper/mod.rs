//! Shared fixtures for integration tests

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use update_server::backend::MemoryBackend;
use update_server::config::ServerConfig;
use update_server::update::platforms;
use update_server::update::responder::UpdateService;
use update_server::version::types::{Asset, Version};

/// SHA1 used for manifest fixture rows
pub const SHA: &str = "94689fede03fed7ab59c24337673a27837f0c3ec";

/// Build a release whose assets get their platform detected from their
/// filenames, each locatable as `<tag>/<filename>`
pub fn release(tag: &str, notes: &str, filenames: &[&str]) -> Version {
    let published_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    filenames.iter().fold(
        Version::try_new(tag, published_at).unwrap().with_notes(notes),
        |version, filename| {
            let platform = platforms::detect(filename)
                .map(|p| p.as_str())
                .expect("fixture filenames must have a detectable platform");
            version.with_asset(
                Asset::new(filename, platform, 1024).with_url(&format!("{tag}/{filename}")),
            )
        },
    )
}

/// Build an update service over an in-memory backend
pub fn service(versions: Vec<Version>, files: &[(&str, &[u8])]) -> UpdateService {
    let mut backend = versions
        .into_iter()
        .fold(MemoryBackend::new(), MemoryBackend::with_version);
    for (key, content) in files {
        backend = backend.with_file(key, content);
    }

    let config = ServerConfig {
        backend: "memory".to_string(),
        ..ServerConfig::default()
    };
    UpdateService::with_backend(config, Arc::new(backend))
}
