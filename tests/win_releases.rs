//! Windows manifest (RELEASES) E2E tests

mod helper;

use helper::{SHA, release, service};
use update_server::update::error::UpdateError;
use update_server::update::responder::CheckRequest;

fn win_catalog() -> Vec<update_server::version::types::Version> {
    vec![
        release(
            "1.0.0",
            "Initial release",
            &["RELEASES", "app-1.0.0-full.nupkg"],
        ),
        release(
            "1.1.0",
            "Crash fixes",
            &["RELEASES", "app-1.1.0-full.nupkg", "app-1.1.0-delta.nupkg"],
        ),
    ]
}

fn manifest_for_1_1_0() -> String {
    // BOM and CRLF the way real packaging tools emit them
    format!(
        "\u{feff}{SHA} app-1.1.0-full.nupkg 2048\r\n{SHA} app-1.1.0-delta.nupkg 512\r\n"
    )
}

fn check(url: &str) -> CheckRequest {
    CheckRequest {
        url: url.to_string(),
        tag: "1.0.0".to_string(),
        platform: "win32".to_string(),
        channel: None,
        filetype: None,
    }
}

#[tokio::test]
async fn manifest_is_rewritten_to_proxy_urls() {
    let service = service(
        win_catalog(),
        &[("1.1.0/RELEASES", manifest_for_1_1_0().as_bytes())],
    );

    let response = service
        .check_update_win(&check("https://updates.example.com/update/win32/1.0.0/RELEASES"))
        .await
        .unwrap();

    assert_eq!(response.filename, "RELEASES");
    assert_eq!(response.content_length, response.body.len() as u64);
    assert_eq!(
        String::from_utf8(response.body).unwrap(),
        format!(
            "{SHA} https://updates.example.com/download/1.1.0/app-1.1.0-full.nupkg 2048\n\
             {SHA} https://updates.example.com/download/1.1.0/app-1.1.0-delta.nupkg 512"
        )
    );
}

#[tokio::test]
async fn channel_route_climbs_two_segments_deeper() {
    let service = service(
        win_catalog(),
        &[("1.1.0/RELEASES", manifest_for_1_1_0().as_bytes())],
    );

    let request = CheckRequest {
        channel: Some("stable".to_string()),
        ..check("https://updates.example.com/update/channel/stable/win32/1.0.0/RELEASES")
    };
    let response = service.check_update_win(&request).await.unwrap();

    let body = String::from_utf8(response.body).unwrap();
    assert!(body.starts_with(&format!(
        "{SHA} https://updates.example.com/download/1.1.0/app-1.1.0-full.nupkg 2048"
    )));
}

#[tokio::test]
async fn mount_prefix_survives_the_rewrite() {
    let service = service(
        win_catalog(),
        &[("1.1.0/RELEASES", manifest_for_1_1_0().as_bytes())],
    );

    let response = service
        .check_update_win(&check(
            "https://example.com/myapp/update/win32/1.0.0/RELEASES",
        ))
        .await
        .unwrap();

    let body = String::from_utf8(response.body).unwrap();
    assert!(body.contains("https://example.com/myapp/download/1.1.0/app-1.1.0-full.nupkg"));
}

#[tokio::test]
async fn junk_manifest_lines_are_dropped_not_fatal() {
    let manifest = format!("not a row\n{SHA} app-1.1.0-full.nupkg 2048\n");
    let service = service(win_catalog(), &[("1.1.0/RELEASES", manifest.as_bytes())]);

    let response = service
        .check_update_win(&check("https://updates.example.com/update/win32/1.0.0/RELEASES"))
        .await
        .unwrap();

    let body = String::from_utf8(response.body).unwrap();
    assert_eq!(body.lines().count(), 1);
}

#[tokio::test]
async fn missing_manifest_asset_is_an_explicit_failure() {
    let service = service(
        vec![release("1.1.0", "", &["app-1.1.0-full.nupkg"])],
        &[],
    );

    let result = service
        .check_update_win(&check("https://updates.example.com/update/win32/1.0.0/RELEASES"))
        .await;
    assert!(matches!(result, Err(UpdateError::AssetNotFound(_))));
}

#[tokio::test]
async fn no_windows_version_is_an_explicit_failure() {
    let service = service(
        vec![release("1.1.0", "", &["app-1.1.0-mac.zip"])],
        &[],
    );

    let result = service
        .check_update_win(&check("https://updates.example.com/update/win32/1.0.0/RELEASES"))
        .await;
    assert!(matches!(result, Err(UpdateError::VersionNotFound)));
}
