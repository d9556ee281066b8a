//! End-to-end inspection through the plugins, with a scripted debugger.

mod support;

use hx_common::Error;
use hx_config::Preset;
use hx_core::plugins::find_plugin;
use std::path::Path;
use support::{build_core, install_fake_gdb, install_reference, write_gzip, write_tarball};

fn preset(text: &str) -> Preset {
    Preset::parse(text, Path::new("test.toml")).unwrap()
}

/// Preset pointing at the fake debugger and a single search path.
fn preset_for(plugin: &str, gdb: &Path, search: &Path, hints: &str) -> Preset {
    preset(&format!(
        r#"
[preset]
name = "it"
plugin = "{plugin}"

[debugger]
executable = "{}"
search_paths = ["{}"]
{hints}
"#,
        gdb.display(),
        search.display()
    ))
}

#[test]
fn test_simple_core_plain_and_gzipped_agree() {
    let dir = tempfile::tempdir().unwrap();
    let gdb = install_fake_gdb(dir.path());
    install_reference(dir.path(), "crashd");

    let core = build_core("crashd", 1234);
    let plain = dir.path().join("core.1234");
    std::fs::write(&plain, &core).unwrap();
    let gzipped = dir.path().join("core.1234.gz");
    write_gzip(&gzipped, &core);

    let plugin = find_plugin("simple-core").unwrap();
    let p = preset_for("simple-core", &gdb, dir.path(), "");
    let haruspex = plugin.create_haruspex(&p).unwrap();

    let from_plain = haruspex.inspect(&plain).unwrap();
    let from_gzip = haruspex.inspect(&gzipped).unwrap();

    assert_eq!(from_plain.executable.as_deref(), Some("crashd"));
    assert_eq!(from_plain.core_dump.as_deref(), Some("core.1234"));
    assert_eq!(from_plain.backtrace, support::FAKE_BACKTRACE);

    // Compression must not change what gets reported.
    assert_eq!(from_gzip.executable, from_plain.executable);
    assert_eq!(from_gzip.core_dump, from_plain.core_dump);
    assert_eq!(from_gzip.backtrace, from_plain.backtrace);
    assert_eq!(from_gzip.debugger, from_plain.debugger);
}

#[test]
fn test_simple_core_rejects_non_core() {
    let dir = tempfile::tempdir().unwrap();
    let gdb = install_fake_gdb(dir.path());
    let bogus = dir.path().join("not-a-core");
    std::fs::write(&bogus, b"just some text").unwrap();

    let plugin = find_plugin("simple-core").unwrap();
    let haruspex = plugin
        .create_haruspex(&preset_for("simple-core", &gdb, dir.path(), ""))
        .unwrap();
    let err = haruspex.inspect(&bogus).unwrap_err();
    assert!(matches!(err, Error::InvalidFile { .. }));
}

#[test]
fn test_wrapped_core_picks_dump_out_of_tarball() {
    let dir = tempfile::tempdir().unwrap();
    let gdb = install_fake_gdb(dir.path());
    install_reference(dir.path(), "svcd");

    let core = build_core("svcd", 99);
    let tarball = dir.path().join("crash.tar");
    write_tarball(
        &tarball,
        &[("messages.log", b"noise".as_slice()), ("core.99", &core)],
    );

    let plugin = find_plugin("wrapped-core").unwrap();
    let haruspex = plugin
        .create_haruspex(&preset_for("wrapped-core", &gdb, dir.path(), ""))
        .unwrap();
    let report = haruspex.inspect(&tarball).unwrap();
    assert_eq!(report.executable.as_deref(), Some("svcd"));
    assert_eq!(report.core_dump.as_deref(), Some("core.99"));
    assert_eq!(report.filename, tarball.display().to_string());
}

#[test]
fn test_wrapped_core_handles_gzipped_member() {
    let dir = tempfile::tempdir().unwrap();
    let gdb = install_fake_gdb(dir.path());
    install_reference(dir.path(), "svcd");

    let core = build_core("svcd", 7);
    let gz = dir.path().join("member.gz");
    write_gzip(&gz, &core);
    let member = std::fs::read(&gz).unwrap();

    let tarball = dir.path().join("crash.tar");
    write_tarball(&tarball, &[("core.7.gz", member.as_slice())]);

    let plugin = find_plugin("wrapped-core").unwrap();
    let haruspex = plugin
        .create_haruspex(&preset_for("wrapped-core", &gdb, dir.path(), ""))
        .unwrap();
    let report = haruspex.inspect(&tarball).unwrap();
    assert_eq!(report.core_dump.as_deref(), Some("core.7"));
}

#[test]
fn test_wrapped_core_no_match_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let gdb = install_fake_gdb(dir.path());

    let tarball = dir.path().join("crash.tar");
    write_tarball(&tarball, &[("messages.log", b"no dump here".as_slice())]);

    let plugin = find_plugin("wrapped-core").unwrap();
    let haruspex = plugin
        .create_haruspex(&preset_for("wrapped-core", &gdb, dir.path(), ""))
        .unwrap();
    let err = haruspex.inspect(&tarball).unwrap_err();
    assert!(matches!(err, Error::NoMatch { .. }));
}

#[test]
fn test_capsula_substitutes_version_into_search_paths() {
    let dir = tempfile::tempdir().unwrap();
    let gdb = install_fake_gdb(dir.path());

    // The reference executable only exists under the versioned sysroot.
    let sysroot = dir.path().join("sysroots/1.2.3/bin");
    std::fs::create_dir_all(&sysroot).unwrap();
    install_reference(&sysroot, "firmwared");

    let core = build_core("firmwared", 41);
    let tarball = dir.path().join("capsule.tar");
    write_tarball(
        &tarball,
        &[
            ("core.41", core.as_slice()),
            ("version.txt", b"version=1.2.3\n".as_slice()),
        ],
    );

    let hints = r#"
[hints]
core_pattern = '^core\.\d+'
version_file = '^version\.txt$'
version_pattern = 'version=(.+)'
"#;
    let search = dir.path().join("sysroots/@VERSION@/bin");
    let plugin = find_plugin("capsula").unwrap();
    let haruspex = plugin
        .create_haruspex(&preset_for("capsula", &gdb, &search, hints))
        .unwrap();

    let report = haruspex.inspect(&tarball).unwrap();
    assert_eq!(report.executable.as_deref(), Some("firmwared"));
    assert_eq!(report.backtrace, support::FAKE_BACKTRACE);
}

#[test]
fn test_capsula_without_version_cannot_resolve_sysroot() {
    let dir = tempfile::tempdir().unwrap();
    let gdb = install_fake_gdb(dir.path());

    let core = build_core("firmwared", 42);
    let tarball = dir.path().join("capsule.tar");
    // No version marker in the archive.
    write_tarball(&tarball, &[("core.42", core.as_slice())]);

    let hints = r#"
[hints]
core_pattern = '^core\.\d+'
version_file = '^version\.txt$'
version_pattern = 'version=(.+)'
"#;
    let search = dir.path().join("sysroots/@VERSION@/bin");
    let plugin = find_plugin("capsula").unwrap();
    let haruspex = plugin
        .create_haruspex(&preset_for("capsula", &gdb, &search, hints))
        .unwrap();

    // The placeholder path is skipped, so the reference lookup fails.
    let err = haruspex.inspect(&tarball).unwrap_err();
    assert!(matches!(err, Error::ExecutableNotFound { .. }));
}
