//! Dropbox HTTP API backend
//!
//! Uses the v2 RPC endpoints (`files/get_metadata`, `files/list_folder`) and
//! content endpoints (`files/download`, `files/upload`). Uploads use
//! `mode = "add"` with `autorename = false`, so Dropbox itself rejects a second
//! upload to the same path with a `path/conflict` error.

use super::{Entry, EntryKind, StorageError, StorageGateway, StorageResult};
use crate::path::VaultPath;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.dropboxapi.com/";
pub const DEFAULT_CONTENT_BASE: &str = "https://content.dropboxapi.com/";

/// Vault stored under a Dropbox folder
pub struct DropboxStore {
    client: Client,
    token: String,
    root: String,
    api_base: Url,
    content_base: Url,
}

#[derive(Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct UploadArg<'a> {
    path: &'a str,
    mode: &'static str,
    autorename: bool,
    mute: bool,
}

#[derive(Serialize)]
struct CursorArg<'a> {
    cursor: &'a str,
}

#[derive(Deserialize)]
struct ListFolderResult {
    entries: Vec<ListEntry>,
    cursor: String,
    has_more: bool,
}

#[derive(Deserialize)]
struct ListEntry {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_summary: String,
}

impl DropboxStore {
    /// Create a store rooted at `root` (e.g. `/Obsidian/Vault`, or empty for
    /// the Dropbox root); every request is bounded by `timeout`
    pub fn new(token: impl Into<String>, root: &str, timeout: Duration) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::backend("build client", &VaultPath::root(), e))?;

        Ok(Self {
            client,
            token: token.into(),
            root: normalize_root(root),
            api_base: parse_base(DEFAULT_API_BASE)?,
            content_base: parse_base(DEFAULT_CONTENT_BASE)?,
        })
    }

    /// Point both endpoint families at other hosts (tests, proxies)
    pub fn with_base_urls(mut self, api_base: &str, content_base: &str) -> StorageResult<Self> {
        self.api_base = parse_base(api_base)?;
        self.content_base = parse_base(content_base)?;
        Ok(self)
    }

    fn dropbox_path(&self, path: &VaultPath) -> String {
        if path.is_root() {
            self.root.clone()
        } else {
            format!("{}/{}", self.root, path.as_str())
        }
    }

    fn rpc(&self, endpoint: &str, path: &VaultPath) -> StorageResult<RequestBuilder> {
        let url = self
            .api_base
            .join(endpoint)
            .map_err(|e| StorageError::backend(endpoint, path, e))?;
        Ok(self.client.post(url).bearer_auth(&self.token))
    }

    fn content(&self, endpoint: &str, path: &VaultPath, arg: &impl Serialize) -> StorageResult<RequestBuilder> {
        let url = self
            .content_base
            .join(endpoint)
            .map_err(|e| StorageError::backend(endpoint, path, e))?;
        let arg = serde_json::to_string(arg).map_err(|e| StorageError::backend(endpoint, path, e))?;
        Ok(self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", header_safe_json(&arg)))
    }

    fn send(&self, request: RequestBuilder, operation: &str, path: &VaultPath) -> StorageResult<Response> {
        request.send().map_err(|e| {
            if e.is_timeout() {
                StorageError::Timeout {
                    operation: operation.to_string(),
                    path: path.clone(),
                }
            } else {
                StorageError::backend(operation, path, e)
            }
        })
    }

    fn list_page(&self, request: RequestBuilder, path: &VaultPath) -> StorageResult<ListFolderResult> {
        let response = self.send(request, "list", path)?;
        match response.status() {
            StatusCode::OK => response
                .json::<ListFolderResult>()
                .map_err(|e| StorageError::backend("list", path, e)),
            _ => Err(classify_failure(response, "list", path)),
        }
    }
}

impl StorageGateway for DropboxStore {
    fn exists(&self, path: &VaultPath) -> StorageResult<bool> {
        // Metadata of the Dropbox root itself is not supported by the API
        if path.is_root() && self.root.is_empty() {
            return Ok(true);
        }
        let dropbox_path = self.dropbox_path(path);
        let request = self
            .rpc("2/files/get_metadata", path)?
            .json(&PathArg { path: &dropbox_path });
        let response = self.send(request, "exists", path)?;

        match response.status() {
            StatusCode::OK => Ok(true),
            _ => match classify_failure(response, "exists", path) {
                StorageError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    fn create(&self, path: &VaultPath, content: &str) -> StorageResult<()> {
        let dropbox_path = self.dropbox_path(path);
        let arg = UploadArg {
            path: &dropbox_path,
            mode: "add",
            autorename: false,
            mute: true,
        };
        let request = self
            .content("2/files/upload", path, &arg)?
            .header("Content-Type", "application/octet-stream")
            .body(content.as_bytes().to_vec());
        let response = self.send(request, "create", path)?;

        match response.status() {
            StatusCode::OK => Ok(()),
            _ => Err(classify_failure(response, "create", path)),
        }
    }

    fn read(&self, path: &VaultPath) -> StorageResult<String> {
        let dropbox_path = self.dropbox_path(path);
        let request = self.content("2/files/download", path, &PathArg { path: &dropbox_path })?;
        let response = self.send(request, "read", path)?;

        match response.status() {
            StatusCode::OK => response
                .text()
                .map_err(|e| StorageError::backend("read", path, e)),
            _ => Err(classify_failure(response, "read", path)),
        }
    }

    fn list_children(&self, path: &VaultPath) -> StorageResult<Vec<Entry>> {
        let dropbox_path = self.dropbox_path(path);
        let request = self
            .rpc("2/files/list_folder", path)?
            .json(&PathArg { path: &dropbox_path });
        let mut page = self.list_page(request, path)?;
        let mut entries = Vec::new();

        loop {
            entries.extend(page.entries.into_iter().filter_map(|e| {
                let kind = match e.tag.as_str() {
                    "file" => EntryKind::File,
                    "folder" => EntryKind::Folder,
                    _ => return None,
                };
                Some(Entry { name: e.name, kind })
            }));

            if !page.has_more {
                break;
            }
            let request = self
                .rpc("2/files/list_folder/continue", path)?
                .json(&CursorArg {
                    cursor: &page.cursor,
                });
            page = self.list_page(request, path)?;
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn describe(&self) -> String {
        format!("dropbox:{}", if self.root.is_empty() { "/" } else { &self.root })
    }
}

/// Map a non-200 response onto the storage error taxonomy
///
/// Dropbox reports endpoint errors as HTTP 409 with an `error_summary` such as
/// `path/not_found/..` or `path/conflict/file/..`.
fn classify_failure(response: Response, operation: &str, path: &VaultPath) -> StorageError {
    let status = response.status();
    let body = response.text().unwrap_or_default();

    if status == StatusCode::CONFLICT {
        let summary = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error_summary)
            .unwrap_or_default();
        if summary.contains("not_found") {
            return StorageError::NotFound(path.clone());
        }
        if summary.contains("conflict") {
            return StorageError::AlreadyExists(path.clone());
        }
        return StorageError::backend(operation, path, summary);
    }

    StorageError::backend(operation, path, format!("HTTP {}: {}", status, body.trim()))
}

fn normalize_root(root: &str) -> String {
    let trimmed = root.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn parse_base(raw: &str) -> StorageResult<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&with_slash).map_err(|e| StorageError::backend("parse base url", &VaultPath::root(), e))
}

/// HTTP headers must be ASCII; escape everything else as JSON `\u` sequences
fn header_safe_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}
