// Fixtures shared by the integration tests

use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Map, Value};

/// Registry document for `name` publishing `versions`, with tarballs
/// served from `base_url`
pub fn packument(base_url: &str, name: &str, versions: &[&str], latest: Option<&str>) -> Value {
    let mut version_map = Map::new();
    for version in versions {
        version_map.insert(
            (*version).to_string(),
            json!({
                "name": name,
                "version": version,
                "dist": {
                    "tarball": format!("{base_url}/tarballs/{}-{version}.tgz", tarball_stem(name)),
                }
            }),
        );
    }

    let mut doc = json!({ "name": name, "versions": version_map });
    if let Some(latest) = latest {
        doc["dist-tags"] = json!({ "latest": latest });
    }
    doc
}

/// `@scope/name` → `scope-name`, used to build tarball URLs
pub fn tarball_stem(name: &str) -> String {
    name.trim_start_matches('@').replace('/', "-")
}

/// Request path the registry client uses for `name`
pub fn registry_path(name: &str) -> String {
    format!("/{}", name.replace('/', "%2f"))
}

/// gzip'd tar laid out like `npm pack` output, everything under `package/`
pub fn package_tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("package/{path}"), contents.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// Command package whose entry file is `lib/index.js`
pub fn command_package_tarball(name: &str, version: &str) -> Vec<u8> {
    let manifest = json!({ "name": name, "version": version, "main": "lib/index.js" }).to_string();
    package_tarball(&[
        ("package.json", manifest.as_str()),
        ("lib/index.js", "module.exports = function () {};\n"),
    ])
}

/// Stand-in for `node`: records its arguments into `record`, one per
/// line, then exits with `code`
#[cfg(unix)]
pub fn fake_node(dir: &Path, record: &Path, code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-node");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\nfor arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '{}'; done\nexit {code}\n",
            record.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Local package directory with a manifest and, optionally, its entry file
pub fn local_package(dir: &Path, main: Option<&str>) -> PathBuf {
    let package_dir = dir.join("local-package");
    std::fs::create_dir_all(&package_dir).unwrap();

    let manifest = match main {
        Some(main) => {
            std::fs::write(package_dir.join(main), "module.exports = function () {};\n").unwrap();
            json!({ "name": "local-package", "version": "0.0.0", "main": main })
        }
        None => json!({ "name": "local-package", "version": "0.0.0" }),
    };
    std::fs::write(package_dir.join("package.json"), manifest.to_string()).unwrap();
    package_dir
}
