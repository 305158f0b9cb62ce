//! Fixtures shared by the toolchain unit tests.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use flate2::Compression;
use flate2::write::GzEncoder;

use super::download::{Fetcher, ProgressCallback};
use crate::errors::GovmError;

/// Shell script standing in for `bin/go`.
pub(crate) fn go_script(version: &str) -> String {
    format!("#!/bin/sh\necho \"go version go{version} linux/amd64\"\n")
}

/// A minimal Go distribution as tar.gz bytes: `go/bin/go` and `go/VERSION`.
pub(crate) fn go_tar_gz_bytes(version: &str) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_size(0);
    header.set_mode(0o755);
    header.set_cksum();
    builder
        .append_data(&mut header, "go/bin/", std::io::empty())
        .expect("Should append directory");

    let script = go_script(version);
    let mut header = tar::Header::new_gnu();
    header.set_size(script.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder
        .append_data(&mut header, "go/bin/go", script.as_bytes())
        .expect("Should append file");

    let marker = format!("go{version}\n");
    let mut header = tar::Header::new_gnu();
    header.set_size(marker.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "go/VERSION", marker.as_bytes())
        .expect("Should append file");

    builder
        .into_inner()
        .expect("Should finish tar")
        .finish()
        .expect("Should finish gzip")
}

pub(crate) fn write_go_tar_gz(path: &Path, version: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Should create parent");
    }
    std::fs::write(path, go_tar_gz_bytes(version)).expect("Should write archive");
}

pub(crate) fn write_go_zip(path: &Path, version: &str) {
    let file = std::fs::File::create(path).expect("Should create file");
    let mut zip = zip::ZipWriter::new(file);

    let exec = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
    zip.start_file("go/bin/go", exec).expect("Should start file");
    zip.write_all(go_script(version).as_bytes())
        .expect("Should write");

    let plain = zip::write::SimpleFileOptions::default().unix_permissions(0o644);
    zip.start_file("go/VERSION", plain).expect("Should start file");
    zip.write_all(format!("go{version}\n").as_bytes())
        .expect("Should write");

    zip.finish().expect("Should finish");
}

/// Writes an executable `bin/go` under `toolchain`.
#[cfg(unix)]
pub(crate) fn write_go_binary(toolchain: &Path, version: &str) {
    use std::os::unix::fs::PermissionsExt;

    let bin = toolchain.join("bin");
    std::fs::create_dir_all(&bin).expect("Should create bin");
    let go = bin.join("go");
    std::fs::write(&go, go_script(version)).expect("Should write script");
    std::fs::set_permissions(&go, std::fs::Permissions::from_mode(0o755))
        .expect("Should set permissions");
}

/// In-memory [`Fetcher`] recording every URL it is asked for.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    bodies: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub(crate) fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    fn body(&self, url: &str) -> Result<&Vec<u8>, GovmError> {
        self.calls.lock().expect("lock").push(url.to_string());
        self.bodies
            .get(url)
            .ok_or_else(|| GovmError::download_failed(url, "HTTP error 404 Not Found"))
    }
}

impl Fetcher for FakeFetcher {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        _progress: Option<ProgressCallback>,
    ) -> Result<(), GovmError> {
        let body = self.body(url)?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).expect("Should create parent");
        }
        std::fs::write(dest, body).expect("Should write body");
        Ok(())
    }

    async fn fetch_text(&self, url: &str) -> Result<String, GovmError> {
        let body = self.body(url)?;
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}
