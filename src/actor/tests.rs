use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use super::coordinator::Coordinator;
use super::messages::ChangeEvent;
use super::recompile::{RecompileActor, RecompileStats};
use super::watcher::DocWatcher;
use crate::compiler::{Compiler, Convert, ConvertError, OutputRoot, OutputWriter, build_all};
use crate::config::WikiConfig;
use crate::core::{DocPath, Shutdown, Snapshot};
use crate::utils::exec::Cmd;

const TICK: Duration = Duration::from_millis(20);
const WAIT: Duration = Duration::from_secs(5);

fn doc(path: &str) -> DocPath {
    DocPath::from_relative(Path::new(path)).unwrap()
}

fn convert_error(source: &Path) -> ConvertError {
    let err = Cmd::new("sh")
        .args(["-c", "echo 'syntax error' >&2; exit 1"])
        .run()
        .unwrap_err();
    ConvertError {
        path: source.to_path_buf(),
        source: err,
    }
}

/// Renders `# Heading` lines as `<h1>`; everything else becomes `<p>`.
struct HeadingConverter;

impl Convert for HeadingConverter {
    fn convert(&self, source: &Path) -> Result<Vec<u8>, ConvertError> {
        let text = std::fs::read_to_string(source).map_err(|_| convert_error(source))?;
        if text.contains("!!broken") {
            return Err(convert_error(source));
        }
        let html: String = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| match line.strip_prefix("# ") {
                Some(heading) => format!("<h1>{heading}</h1>\n"),
                None => format!("<p>{line}</p>\n"),
            })
            .collect();
        Ok(html.into_bytes())
    }
}

/// Records the highest number of conversions running at once.
#[derive(Default)]
struct SlowConverter {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl Convert for SlowConverter {
    fn convert(&self, _source: &Path) -> Result<Vec<u8>, ConvertError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(b"<p>slow</p>".to_vec())
    }
}

struct Fixture {
    _source: TempDir,
    output: OutputRoot,
    config: Arc<WikiConfig>,
}

impl Fixture {
    fn new(files: &[(&str, &str)]) -> Self {
        let source = TempDir::new().unwrap();
        for (path, content) in files {
            let path = source.path().join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let mut config = WikiConfig::default();
        config.source = source.path().canonicalize().unwrap();
        config.watch.interval_ms = TICK.as_millis() as u64;
        Self {
            _source: source,
            output: OutputRoot::create().unwrap(),
            config: Arc::new(config),
        }
    }

    fn compiler(&self, converter: Arc<dyn Convert>) -> Arc<Compiler> {
        let writer = OutputWriter::new(&self.config, self.output.path(), None);
        Arc::new(Compiler::new(&self.config.source, converter, writer))
    }

    fn source(&self, path: &str) -> std::path::PathBuf {
        doc(path).source_path(&self.config.source)
    }

    fn baseline(&self, path: &str) -> Option<Snapshot> {
        Snapshot::read(&self.source(path)).ok()
    }

    fn artifact(&self, path: &str) -> std::path::PathBuf {
        self.output.path().join(path)
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(TICK).await;
    }
    false
}

// =============================================================================
// DocWatcher
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_emits_one_event_per_change() {
    let fx = Fixture::new(&[("a.md", "# X")]);
    let (tx, mut rx) = mpsc::channel(8);
    let (trigger, shutdown) = Shutdown::new();

    let watcher =
        DocWatcher::new(doc("a.md"), fx.source("a.md"), fx.baseline("a.md"), TICK, tx, shutdown);
    let handle = tokio::spawn(watcher.run());

    // Nothing changes: no events
    tokio::time::sleep(TICK * 5).await;
    assert!(rx.try_recv().is_err());

    std::fs::write(fx.source("a.md"), "# X with more text").unwrap();
    let event = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(event, ChangeEvent::new(doc("a.md")));

    // Same state on later ticks: still exactly one event
    tokio::time::sleep(TICK * 5).await;
    assert!(rx.try_recv().is_err());

    trigger.fire();
    tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_survives_stat_errors() {
    let fx = Fixture::new(&[("a.md", "first")]);
    let (tx, mut rx) = mpsc::channel(8);
    let (trigger, shutdown) = Shutdown::new();

    let watcher =
        DocWatcher::new(doc("a.md"), fx.source("a.md"), fx.baseline("a.md"), TICK, tx, shutdown);
    let handle = tokio::spawn(watcher.run());
    tokio::time::sleep(TICK * 2).await;

    // Stat fails while the file is gone; the loop keeps running
    std::fs::remove_file(fx.source("a.md")).unwrap();
    tokio::time::sleep(TICK * 5).await;
    assert!(rx.try_recv().is_err());
    assert!(!handle.is_finished());

    std::fs::write(fx.source("a.md"), "second, longer").unwrap();
    let event = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(event.doc.as_str(), "a.md");

    trigger.fire();
    tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_reports_change_since_baseline() {
    let fx = Fixture::new(&[("a.md", "# X")]);
    let baseline = fx.baseline("a.md");
    // Edited after the baseline was taken but before the watcher starts
    std::fs::write(fx.source("a.md"), "# X, edited early").unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let (trigger, shutdown) = Shutdown::new();
    let watcher = DocWatcher::new(doc("a.md"), fx.source("a.md"), baseline, TICK, tx, shutdown);
    let handle = tokio::spawn(watcher.run());

    let event = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(event.doc.as_str(), "a.md");
    tokio::time::sleep(TICK * 5).await;
    assert!(rx.try_recv().is_err());

    trigger.fire();
    tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_without_baseline_reports_first_stat() {
    let fx = Fixture::new(&[("a.md", "# X")]);
    let (tx, mut rx) = mpsc::channel(8);
    let (trigger, shutdown) = Shutdown::new();

    let watcher = DocWatcher::new(doc("a.md"), fx.source("a.md"), None, TICK, tx, shutdown);
    let handle = tokio::spawn(watcher.run());

    let event = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(event.doc.as_str(), "a.md");

    trigger.fire();
    tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_stops_when_blocked_on_full_channel() {
    let fx = Fixture::new(&[("a.md", "1")]);
    let (tx, mut rx) = mpsc::channel(1);
    let (trigger, shutdown) = Shutdown::new();

    let watcher =
        DocWatcher::new(doc("a.md"), fx.source("a.md"), fx.baseline("a.md"), TICK, tx, shutdown);
    let handle = tokio::spawn(watcher.run());
    tokio::time::sleep(TICK * 2).await;

    // Fill the channel, then cause another change the watcher cannot send
    std::fs::write(fx.source("a.md"), "22").unwrap();
    assert!(wait_until(|| rx.len() == 1).await);
    std::fs::write(fx.source("a.md"), "333").unwrap();
    tokio::time::sleep(TICK * 5).await;

    trigger.fire();
    tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
    assert_eq!(rx.recv().await.unwrap().doc.as_str(), "a.md");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_stops_when_receiver_dropped() {
    let fx = Fixture::new(&[("a.md", "1")]);
    let (tx, rx) = mpsc::channel(1);
    let (_trigger, shutdown) = Shutdown::new();

    let watcher =
        DocWatcher::new(doc("a.md"), fx.source("a.md"), fx.baseline("a.md"), TICK, tx, shutdown);
    let handle = tokio::spawn(watcher.run());
    drop(rx);
    tokio::time::sleep(TICK * 2).await;

    std::fs::write(fx.source("a.md"), "changed").unwrap();
    tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
}

// =============================================================================
// RecompileActor
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_recompile_is_serialized() {
    let fx = Fixture::new(&[("a.md", ""), ("b.md", ""), ("c.md", "")]);
    let converter = Arc::new(SlowConverter::default());
    let compiler = fx.compiler(converter.clone());
    let (tx, rx) = mpsc::channel(8);
    let (_trigger, shutdown) = Shutdown::new();

    // All three arrive at the same instant
    for name in ["a.md", "b.md", "c.md"] {
        tx.send(ChangeEvent::new(doc(name))).await.unwrap();
    }
    drop(tx);

    let stats = RecompileActor::new(rx, compiler, shutdown).run().await;

    assert_eq!(stats, RecompileStats { rebuilt: 3, failed: 0 });
    assert_eq!(converter.calls.load(Ordering::SeqCst), 3);
    assert_eq!(converter.max_in_flight.load(Ordering::SeqCst), 1);
    assert!(fx.artifact("c.html").is_file());
}

#[tokio::test]
async fn test_recompile_continues_after_failure() {
    let fx = Fixture::new(&[("bad.md", "!!broken"), ("good.md", "# Fine")]);
    let compiler = fx.compiler(Arc::new(HeadingConverter));
    let (tx, rx) = mpsc::channel(8);
    let (_trigger, shutdown) = Shutdown::new();

    tx.send(ChangeEvent::new(doc("bad.md"))).await.unwrap();
    tx.send(ChangeEvent::new(doc("good.md"))).await.unwrap();
    drop(tx);

    let stats = RecompileActor::new(rx, compiler, shutdown).run().await;

    assert_eq!(stats, RecompileStats { rebuilt: 1, failed: 1 });
    assert!(!fx.artifact("bad.html").exists());
    assert_eq!(std::fs::read(fx.artifact("good.html")).unwrap(), b"<h1>Fine</h1>\n");
}

#[tokio::test]
async fn test_failed_recompile_keeps_last_good_artifact() {
    let fx = Fixture::new(&[("a.md", "# Good")]);
    let compiler = fx.compiler(Arc::new(HeadingConverter));
    compiler.compile(&doc("a.md")).unwrap();

    std::fs::write(fx.source("a.md"), "!!broken").unwrap();
    let (tx, rx) = mpsc::channel(8);
    let (_trigger, shutdown) = Shutdown::new();
    tx.send(ChangeEvent::new(doc("a.md"))).await.unwrap();
    drop(tx);

    let stats = RecompileActor::new(rx, compiler, shutdown).run().await;

    assert_eq!(stats.failed, 1);
    assert_eq!(std::fs::read(fx.artifact("a.html")).unwrap(), b"<h1>Good</h1>\n");
}

#[tokio::test]
async fn test_recompile_stops_on_shutdown() {
    let fx = Fixture::new(&[]);
    let compiler = fx.compiler(Arc::new(HeadingConverter));
    let (_tx, rx) = mpsc::channel::<ChangeEvent>(8);
    let (trigger, shutdown) = Shutdown::new();

    let handle = tokio::spawn(RecompileActor::new(rx, compiler, shutdown).run());
    trigger.fire();

    let stats = tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
    assert_eq!(stats, RecompileStats::default());
}

// =============================================================================
// Coordinator (bulk build → watch → recompile)
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_edit_rewrites_artifact() {
    let fx = Fixture::new(&[("a/b.md", "# X"), ("index.md", "# Home")]);
    let compiler = fx.compiler(Arc::new(HeadingConverter));

    let report = build_all(&fx.config, &compiler).unwrap();
    assert_eq!(report.converted, 2);
    assert_eq!(std::fs::read(fx.artifact("a/b.html")).unwrap(), b"<h1>X</h1>\n");

    let (trigger, shutdown) = Shutdown::new();
    let coordinator = Coordinator::new(
        Arc::clone(&fx.config),
        Arc::clone(&compiler),
        report.documents,
        shutdown,
    );
    let handle = tokio::spawn(coordinator.run());
    tokio::time::sleep(TICK * 3).await;

    std::fs::write(fx.source("a/b.md"), "# X\n\nnew paragraph").unwrap();

    let artifact = fx.artifact("a/b.html");
    let updated = wait_until(|| {
        std::fs::read(&artifact).is_ok_and(|bytes| bytes == b"<h1>X</h1>\n<p>new paragraph</p>\n")
    })
    .await;
    assert!(updated, "artifact was not rewritten");

    // The untouched document is not recompiled
    trigger.fire();
    let stats = tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
    assert_eq!(stats.rebuilt, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_edit_during_bulk_build_is_picked_up() {
    let fx = Fixture::new(&[("a.md", "# Old")]);
    let compiler = fx.compiler(Arc::new(HeadingConverter));

    let report = build_all(&fx.config, &compiler).unwrap();
    assert_eq!(std::fs::read(fx.artifact("a.html")).unwrap(), b"<h1>Old</h1>\n");

    // Lands after the baseline stat, before any watcher polls
    std::fs::write(fx.source("a.md"), "# Newer title").unwrap();

    let (trigger, shutdown) = Shutdown::new();
    let handle = tokio::spawn(
        Coordinator::new(Arc::clone(&fx.config), compiler, report.documents, shutdown).run(),
    );

    let artifact = fx.artifact("a.html");
    let updated =
        wait_until(|| std::fs::read(&artifact).is_ok_and(|b| b == b"<h1>Newer title</h1>\n"))
            .await;
    assert!(updated, "artifact was not rewritten");

    trigger.fire();
    let stats = tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
    assert_eq!(stats.rebuilt, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_coordinator_with_no_documents() {
    let fx = Fixture::new(&[]);
    let compiler = fx.compiler(Arc::new(HeadingConverter));
    let (trigger, shutdown) = Shutdown::new();

    let handle = tokio::spawn(
        Coordinator::new(Arc::clone(&fx.config), compiler, Vec::new(), shutdown).run(),
    );
    tokio::time::sleep(TICK * 2).await;
    trigger.fire();

    let stats = tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
    assert_eq!(stats, RecompileStats::default());
}
