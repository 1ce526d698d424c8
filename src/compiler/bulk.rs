//! Initial bulk build: one conversion task per document, wait for all.

use anyhow::Result;
use parking_lot::Mutex;

use super::{CompileError, Compiler, collect_documents};
use crate::config::WikiConfig;
use crate::core::{DocPath, Snapshot, Tracked};
use crate::logger::BuildProgress;
use crate::utils::plural_count;
use crate::{debug, log};

/// Outcome of the initial build.
#[derive(Debug)]
pub struct BuildReport {
    /// Every tracked document, converted or not; these get watchers.
    pub documents: Vec<Tracked>,
    pub converted: usize,
    pub failed: Vec<(DocPath, CompileError)>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Walk the source tree and convert every document concurrently.
///
/// Returns once every task has finished. A failed document is reported and
/// counted but never stops its siblings; only a failed walk is an error.
pub fn build_all(config: &WikiConfig, compiler: &Compiler) -> Result<BuildReport> {
    let documents = collect_documents(config)?;

    if documents.is_empty() {
        log!("build"; "no .{} documents found", config.convert.source_ext);
        return Ok(BuildReport {
            documents: Vec::new(),
            converted: 0,
            failed: Vec::new(),
        });
    }

    log!("build"; "converting {}", plural_count(documents.len(), "document"));

    let progress = BuildProgress::new(documents.len());
    let tracked = Mutex::new(Vec::with_capacity(documents.len()));
    let failed = Mutex::new(Vec::new());

    rayon::scope(|scope| {
        for doc in documents {
            let progress = &progress;
            let tracked = &tracked;
            let failed = &failed;
            scope.spawn(move |_| {
                // Stat before converting: an edit landing mid-conversion
                // must differ from the baseline
                let baseline = match Snapshot::read(&doc.source_path(&config.source)) {
                    Ok(snapshot) => Some(snapshot),
                    Err(e) => {
                        debug!("build"; "cannot stat {}: {}", doc, e);
                        None
                    }
                };

                match compiler.compile(&doc) {
                    Ok(path) => {
                        debug!("build"; "{} -> {}", doc, path.display());
                        progress.converted();
                    }
                    Err(err) => {
                        progress.failed();
                        failed.lock().push((doc.clone(), err));
                    }
                }
                tracked.lock().push(Tracked { doc, baseline });
            });
        }
    });

    let (converted, _) = progress.counts();
    progress.finish();

    let mut documents = tracked.into_inner();
    documents.sort_by(|a, b| a.doc.cmp(&b.doc));
    let mut failed = failed.into_inner();
    failed.sort_by(|a, b| a.0.cmp(&b.0));
    for (doc, err) in &failed {
        log!("error"; "{}: {}\n{}", doc, err, err.detail());
    }

    Ok(BuildReport {
        documents,
        converted,
        failed,
    })
}
