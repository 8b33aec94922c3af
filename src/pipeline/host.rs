//! Long-lived incremental host.
//!
//! Holds one `StageCache` per stage and reruns only what changed between
//! snapshots. Each stage is looked up by its full input:
//!
//! - extraction by file path and content hash
//! - analysis by `AnalysisInput` (handler, reachable groups, settings)
//! - duplicate detection by the ordered list of clean endpoints
//! - emission by `UnitInput` (one owner's endpoints plus options)
//!
//! A successful run sweeps every cache, so entries belonging to files or
//! handlers that disappeared are dropped. A cancelled run skips the sweep;
//! whatever it computed before stopping stays cached for the next run.

use super::{extract_source, finish, CancelFlag, PipelineOutput, PipelineSettings, StageOutput};
use crate::analysis::{analyze_handler, AnalysisInput, GroupTable};
use crate::cache::{content_hash, CacheStats, StageCache};
use crate::core::{EndpointDescriptor, Result};
use crate::emit::{group_by_owner, render_unit, RenderedUnit, UnitInput};
use crate::extraction::{ExtractedFileData, SourceFile};
use crate::observability::{set_phase, PipelinePhase};
use crate::routing::detect_duplicates;
use serde::Serialize;
use tracing::{debug, info, info_span};

/// Identity of a file version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileSnapshot {
    pub path: String,
    pub content_hash: String,
}

impl FileSnapshot {
    pub fn of(file: &SourceFile) -> Self {
        Self {
            path: file.path.clone(),
            content_hash: content_hash(&file.content),
        }
    }
}

/// Per-stage cache statistics for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostStats {
    pub extraction: CacheStats,
    pub analysis: CacheStats,
    pub duplicates: CacheStats,
    pub emission: CacheStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRun {
    pub output: PipelineOutput,
    pub stats: HostStats,
}

pub struct IncrementalHost {
    settings: PipelineSettings,
    extraction: StageCache<FileSnapshot, StageOutput<ExtractedFileData>>,
    analysis: StageCache<AnalysisInput, StageOutput<Option<EndpointDescriptor>>>,
    duplicates: StageCache<Vec<EndpointDescriptor>, StageOutput<Vec<EndpointDescriptor>>>,
    emission: StageCache<UnitInput, Option<RenderedUnit>>,
}

impl IncrementalHost {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            extraction: StageCache::new("extraction"),
            analysis: StageCache::new("analysis"),
            duplicates: StageCache::new("duplicates"),
            emission: StageCache::new("emission"),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Replace the settings. Cached entries stay; entries keyed on the old
    /// settings simply stop matching and are swept by the next run.
    pub fn set_settings(&mut self, settings: PipelineSettings) {
        self.settings = settings;
    }

    /// Run over a full snapshot of the source files.
    ///
    /// # Errors
    ///
    /// Returns `RouteGenError::Cancelled` if `cancel` fires before the run
    /// completes. No partial output is produced.
    pub fn run(&mut self, sources: &[SourceFile], cancel: &CancelFlag) -> Result<HostRun> {
        if !self.settings.enabled {
            info!("routegen is disabled; skipping");
            return Ok(HostRun {
                output: PipelineOutput::default(),
                stats: HostStats::default(),
            });
        }
        let _span = info_span!("incremental_run", files = sources.len()).entered();
        self.begin_run();

        let mut diagnostics = Vec::new();

        let files = {
            let _phase = set_phase(PipelinePhase::Extraction);
            let mut files = Vec::with_capacity(sources.len());
            for source in sources {
                cancel.check()?;
                let snapshot = FileSnapshot::of(source);
                let output = self.extraction.get_or_compute(&snapshot, |_| extract_source(source));
                files.push(output.drain_into(&mut diagnostics));
            }
            files
        };

        let clean = {
            let _phase = set_phase(PipelinePhase::Analysis);
            let structs = super::collect_structs(&files);
            let table = GroupTable::new(&structs);
            let mut clean = Vec::new();
            for handler in files.iter().flat_map(|file| file.handlers.iter()) {
                cancel.check()?;
                let input = AnalysisInput::new(handler.clone(), &table, &self.settings.analysis);
                let output = self.analysis.get_or_compute(&input, analyze_handler);
                if let Some(endpoint) = output.drain_into(&mut diagnostics) {
                    clean.push(endpoint);
                }
            }
            clean.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
            clean
        };

        cancel.check()?;
        let survivors = {
            let _phase = set_phase(PipelinePhase::DuplicateDetection);
            self.duplicates
                .get_or_compute(&clean, |endpoints| detect_duplicates(endpoints))
                .drain_into(&mut diagnostics)
        };

        let units = {
            let _phase = set_phase(PipelinePhase::Emission);
            let mut units = Vec::new();
            for group in group_by_owner(&survivors) {
                cancel.check()?;
                let input = UnitInput {
                    endpoints: group,
                    options: self.settings.emit.clone(),
                };
                if let Some(unit) = self.emission.get_or_compute(&input, render_unit) {
                    units.push(unit);
                }
            }
            units
        };

        let evicted = self.sweep();
        let stats = self.stats();
        debug!(
            evicted,
            extraction_hits = stats.extraction.hits,
            analysis_hits = stats.analysis.hits,
            emission_hits = stats.emission.hits,
            "Incremental run complete"
        );

        Ok(HostRun {
            output: finish(survivors, units, diagnostics, &self.settings.policy),
            stats,
        })
    }

    pub fn stats(&self) -> HostStats {
        HostStats {
            extraction: self.extraction.stats(),
            analysis: self.analysis.stats(),
            duplicates: self.duplicates.stats(),
            emission: self.emission.stats(),
        }
    }

    /// Total number of cached entries across all stages.
    pub fn cached_entries(&self) -> usize {
        self.extraction.len() + self.analysis.len() + self.duplicates.len() + self.emission.len()
    }

    pub fn clear(&mut self) {
        self.extraction.clear();
        self.analysis.clear();
        self.duplicates.clear();
        self.emission.clear();
    }

    fn begin_run(&mut self) {
        self.extraction.begin_run();
        self.analysis.begin_run();
        self.duplicates.begin_run();
        self.emission.begin_run();
    }

    fn sweep(&mut self) -> usize {
        self.extraction.sweep() + self.analysis.sweep() + self.duplicates.sweep() + self.emission.sweep()
    }
}
