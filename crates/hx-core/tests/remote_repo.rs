//! Repository-backed operations end to end, over a directory fetcher.

mod support;

use filetime::{set_file_mtime, FileTime};
use hx_config::Preset;
use hx_core::plugins::find_plugin;
use std::path::Path;
use std::time::Duration;
use support::{build_core, install_fake_gdb, install_reference, write_gzip};

fn age(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(1_700_000_000 - secs, 0)).unwrap();
}

#[test]
fn test_peek_lists_newest_first() {
    let spool = tempfile::tempdir().unwrap();
    for (name, secs) in [("old.gz", 200i64), ("new.gz", 0), ("mid.gz", 100)] {
        let path = spool.path().join(name);
        std::fs::write(&path, b"x").unwrap();
        age(&path, secs);
    }

    let preset = Preset::parse(
        &format!(
            "[preset]\nname = \"t\"\nplugin = \"test\"\n\n[repository]\nurl = \"file://{}\"\n",
            spool.path().display()
        ),
        Path::new("t.toml"),
    )
    .unwrap();
    let haruspex = find_plugin("test").unwrap().create_haruspex(&preset).unwrap();

    let entries = haruspex.peek(None, 2).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.filename.as_str()).collect();
    assert_eq!(names, vec!["new.gz", "mid.gz"]);
}

#[test]
fn test_reveal_inspects_newest_archive() {
    let spool = tempfile::tempdir().unwrap();
    let host = tempfile::tempdir().unwrap();
    let gdb = install_fake_gdb(host.path());
    install_reference(host.path(), "crashd");

    let newest = spool.path().join("core.55.gz");
    write_gzip(&newest, &build_core("crashd", 55));
    let older = spool.path().join("core.11.gz");
    write_gzip(&older, &build_core("crashd", 11));
    age(&older, 500);

    let preset = Preset::parse(
        &format!(
            r#"
[preset]
name = "t"
plugin = "simple-core"

[debugger]
executable = "{}"
search_paths = ["{}"]

[repository]
url = "file://{}"
period = 1
"#,
            gdb.display(),
            host.path().display(),
            spool.path().display()
        ),
        Path::new("t.toml"),
    )
    .unwrap();
    let haruspex = find_plugin("simple-core")
        .unwrap()
        .create_haruspex(&preset)
        .unwrap();

    let mut last_percent = 0u8;
    let mut on_progress = |_bytes: u64, percent: u8| last_percent = percent;
    let report = haruspex.reveal(None, Some(&mut on_progress)).unwrap();

    // The report names the remote archive, not the temp download path.
    assert_eq!(report.filename, "core.55.gz");
    assert_eq!(report.core_dump.as_deref(), Some("core.55"));
    assert_eq!(report.executable.as_deref(), Some("crashd"));
    assert_eq!(report.backtrace, support::FAKE_BACKTRACE);
    assert_eq!(last_percent, 100);
}

#[test]
fn test_watch_reports_only_new_arrivals() {
    let spool = tempfile::tempdir().unwrap();
    std::fs::write(spool.path().join("seed.bin"), b"already there").unwrap();

    let preset = Preset::parse(
        &format!(
            "[preset]\nname = \"t\"\nplugin = \"test\"\n\n[repository]\nurl = \"file://{}\"\nperiod = 1\n",
            spool.path().display()
        ),
        Path::new("t.toml"),
    )
    .unwrap();
    let haruspex = find_plugin("test").unwrap().create_haruspex(&preset).unwrap();

    let writer = {
        let spool = spool.path().to_path_buf();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            std::fs::write(spool.join("fresh.bin"), b"new arrival").unwrap();
        })
    };

    let mut seen = Vec::new();
    haruspex
        .watch(None, Duration::from_millis(600), &mut |report| {
            seen.push(report.filename.clone());
            Ok(())
        })
        .unwrap();
    writer.join().unwrap();

    // The pre-existing archive never fires; the new one fires once.
    assert_eq!(seen, vec!["fresh.bin".to_string()]);
}
