#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use assert_cmd::assert::Assert;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// Temp workspace with a `tree/` holding `a.txt` ("hello") and `sub/b.txt`.
pub fn prepare_tree(prefix: &str) -> (TempDir, PathBuf) {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir");
    let root = fs::canonicalize(temp.path())
        .expect("canonical temp")
        .join("tree");
    fs::create_dir_all(root.join("sub")).expect("create tree");
    fs::write(root.join("a.txt"), b"hello").expect("write a.txt");
    fs::write(root.join("sub").join("b.txt"), b"bee").expect("write b.txt");
    (temp, root)
}

pub fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub fn stdout_json(assert: &Assert) -> Value {
    let output = &assert.get_output().stdout;
    serde_json::from_slice(output).unwrap_or_else(|err| {
        panic!(
            "stdout is not JSON ({err}): {}",
            String::from_utf8_lossy(output)
        )
    })
}

pub fn stdout_text(assert: &Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout")
}

pub fn stderr_text(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

pub fn sha256_file(path: &Path) -> String {
    let bytes = fs::read(path).expect("read artifact");
    format!("{:x}", Sha256::digest(bytes))
}
