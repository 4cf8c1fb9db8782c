//! End-to-end pipeline tests.
//!
//! The hermetic tests serve fixture archives from a loopback HTTP server
//! and swap the external tools for mocks, so they run anywhere. The real
//! runs at the bottom are `#[ignore]` because they require `make`, `tar`,
//! and `lzip` on PATH; run them with `cargo test --test e2e -- --ignored`.

use galaxian_core::{Engine, MockArchiver, MockTool, RunPaths, TarLzip, ToolAction, UnitState};
use galaxian_manifest::{interpret, IniDocument};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;

/// Minimal GET-only file server for hermetic fetches.
struct MockServer {
    addr: String,
    _handle: std::thread::JoinHandle<()>,
}

impl MockServer {
    fn start(routes: HashMap<String, Vec<u8>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());
        let routes = Arc::new(routes);

        let handle = std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let routes = Arc::clone(&routes);

                std::thread::spawn(move || {
                    let mut reader = BufReader::new(stream.try_clone().unwrap());
                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).is_err() {
                        return;
                    }
                    let parts: Vec<&str> = request_line.trim().splitn(3, ' ').collect();
                    if parts.len() < 2 {
                        return;
                    }
                    let path = parts[1].to_owned();
                    loop {
                        let mut line = String::new();
                        if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
                            break;
                        }
                    }

                    let response = if let Some(body) = routes.get(&path) {
                        let mut r = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        )
                        .into_bytes();
                        r.extend_from_slice(body);
                        r
                    } else {
                        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                            .to_vec()
                    };
                    let _ = stream.write_all(&response);
                    let _ = stream.flush();
                });
            }
        });

        MockServer {
            addr,
            _handle: handle,
        }
    }
}

/// A tar.gz holding a one-project Makefile tree at the archive root.
fn project_fixture() -> Vec<u8> {
    let makefile = concat!(
        "release:\n",
        "\techo built > artifact-$(TP)\n",
        "\n",
        "install:\n",
        "\tmkdir -p $(PREFIX)/bin\n",
        "\tcp artifact-$(TP) $(PREFIX)/bin/artifact\n",
    );
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_size(makefile.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "Makefile", makefile.as_bytes())
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

fn manifest_text(server_addr: &str, digest: &str, target: &str, enabled: &str) -> String {
    format!(
        concat!(
            "ident=myident\n",
            "ver=1.0.0\n",
            "tp={target}\n",
            "\n",
            "[lib.src]\n",
            "url={addr}/lib.tar.gz\n",
            "sha2_256sum={digest}\n",
            "\n",
            "[lib.proj]\n",
            "src=lib\n",
            "cwd=.\n",
            "enabled={enabled}\n",
        ),
        target = target,
        addr = server_addr,
        digest = digest,
        enabled = enabled,
    )
}

fn temp_paths(dir: &Path) -> RunPaths {
    RunPaths {
        sources_dir: dir.join("sources"),
        package_dir: dir.join("pkg"),
        output_dir: dir.to_path_buf(),
    }
}

#[test]
fn pipeline_fetches_builds_and_packages() {
    let fixture = project_fixture();
    let digest = hex::encode(Sha256::digest(&fixture));
    let server = MockServer::start(HashMap::from([("/lib.tar.gz".to_owned(), fixture)]));

    let text = manifest_text(&server.addr, &digest, "GBA", "1");
    let plan = interpret(&IniDocument::parse(&text).unwrap()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let paths = temp_paths(dir.path());
    let mock = MockTool::new();
    let engine = Engine::new(Box::new(mock.clone()), Box::new(MockArchiver));

    let report = engine.run(&plan, &paths).unwrap();

    // Source landed where the project expects its tree.
    assert!(paths.sources_dir.join("lib/Makefile").exists());
    assert_eq!(report.sources_fetched, 1);

    // One unit, built then installed into the cross root.
    assert_eq!(report.units.len(), 1);
    assert_eq!(report.units[0].state, UnitState::Done);
    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].action, ToolAction::Build);
    assert_eq!(calls[1].action, ToolAction::Install);
    assert!(calls[1]
        .prefix
        .as_deref()
        .unwrap()
        .ends_with("pkg/opt/aq/xpdevel/agb"));

    // Archive named for the host platform.
    let host_short = galaxian_core::short_name(galaxian_core::host_target().unwrap()).unwrap();
    assert_eq!(
        report.archive.file_name().unwrap().to_str().unwrap(),
        format!("myident-1.0.0-{host_short}.tar.lz")
    );
    assert!(report.archive.exists());
}

#[test]
fn disabled_project_is_skipped_but_packaging_succeeds() {
    let fixture = project_fixture();
    let digest = hex::encode(Sha256::digest(&fixture));
    let server = MockServer::start(HashMap::from([("/lib.tar.gz".to_owned(), fixture)]));

    let text = manifest_text(&server.addr, &digest, "GBA", "0");
    let plan = interpret(&IniDocument::parse(&text).unwrap()).unwrap();
    assert!(plan.projects.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let paths = temp_paths(dir.path());
    let mock = MockTool::new();
    let engine = Engine::new(Box::new(mock.clone()), Box::new(MockArchiver));

    let report = engine.run(&plan, &paths).unwrap();

    assert!(mock.calls().is_empty());
    assert!(report.units.is_empty());
    assert!(report.archive.exists());
}

#[test]
fn duplicate_targets_collapse_to_one_unit() {
    let fixture = project_fixture();
    let digest = hex::encode(Sha256::digest(&fixture));
    let server = MockServer::start(HashMap::from([("/lib.tar.gz".to_owned(), fixture)]));

    let text = manifest_text(&server.addr, &digest, "GBA,gba,GBA", "1");
    let plan = interpret(&IniDocument::parse(&text).unwrap()).unwrap();
    assert_eq!(plan.targets, vec!["GBA"]);

    let dir = tempfile::tempdir().unwrap();
    let paths = temp_paths(dir.path());
    let mock = MockTool::new();
    let engine = Engine::new(Box::new(mock.clone()), Box::new(MockArchiver));

    let report = engine.run(&plan, &paths).unwrap();
    assert_eq!(report.units.len(), 1);
    assert_eq!(mock.calls().len(), 2);
}

#[test]
fn checksum_mismatch_aborts_before_any_build() {
    let fixture = project_fixture();
    let server = MockServer::start(HashMap::from([("/lib.tar.gz".to_owned(), fixture)]));

    let text = manifest_text(&server.addr, &"0".repeat(64), "GBA", "1");
    let plan = interpret(&IniDocument::parse(&text).unwrap()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let paths = temp_paths(dir.path());
    let mock = MockTool::new();
    let engine = Engine::new(Box::new(mock.clone()), Box::new(MockArchiver));

    let err = engine.run(&plan, &paths).unwrap_err();
    assert!(matches!(
        err,
        galaxian_core::CoreError::Fetch(galaxian_fetch::FetchError::ChecksumMismatch { .. })
    ));
    assert!(mock.calls().is_empty());
    // The failed download left nothing behind.
    assert_eq!(fs::read_dir(&paths.sources_dir).unwrap().count(), 0);
}

/// Native build with the real toolchain, per the Linux staging layout.
#[cfg(target_os = "linux")]
#[test]
#[ignore = "requires make, tar, and lzip on PATH"]
fn e2e_native_build_with_real_tools() {
    let fixture = project_fixture();
    let digest = hex::encode(Sha256::digest(&fixture));
    let server = MockServer::start(HashMap::from([("/lib.tar.gz".to_owned(), fixture)]));

    let text = manifest_text(&server.addr, &digest, "LINUX", "1");
    let plan = interpret(&IniDocument::parse(&text).unwrap()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let paths = temp_paths(dir.path());
    let engine = Engine::new(Box::new(galaxian_core::Make), Box::new(TarLzip));

    let report = engine.run(&plan, &paths).unwrap();

    // Native target installs straight into the prefix.
    let installed = paths.package_dir.join("opt/aq/bin/artifact");
    assert_eq!(fs::read(&installed).unwrap(), b"built\n");

    assert_eq!(
        report.archive.file_name().unwrap().to_str().unwrap(),
        "myident-1.0.0-linux64.tar.lz"
    );
    assert!(fs::metadata(&report.archive).unwrap().len() > 0);
}
