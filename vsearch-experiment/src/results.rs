use crate::error::{ExportError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use vsearch_core::{Symbol, TrialConfig, TrialResult};

pub const CSV_HEADER: [&str; 9] = [
    "trial",
    "is_repeat",
    "elapsed_ms",
    "stimulus_index",
    "symbol",
    "is_target",
    "color",
    "x",
    "y",
];

/// One CSV row: a trial's timing joined with one of its glyphs
#[derive(Serialize)]
struct CsvRow<'a> {
    trial: usize,
    is_repeat: bool,
    elapsed_ms: u64,
    stimulus_index: Option<usize>,
    symbol: Option<Symbol>,
    is_target: Option<bool>,
    color: Option<&'a str>,
    x: Option<f32>,
    y: Option<f32>,
}

/// Aggregate timing over the log
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsSummary {
    pub trials: usize,
    pub repeats: usize,
    pub mean_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Append-only, ordered log of completed trials
#[derive(Debug, Clone, Default)]
pub struct ResultsLog {
    entries: Vec<TrialResult>,
}

impl ResultsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: TrialResult) {
        self.entries.push(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrialResult> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[TrialResult] {
        &self.entries
    }

    /// Only a fresh experiment start resets the log
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn summary(&self) -> Option<ResultsSummary> {
        if self.entries.is_empty() {
            return None;
        }
        let times = self.entries.iter().map(|r| r.elapsed_ms);
        let total: u64 = times.clone().sum();
        Some(ResultsSummary {
            trials: self.entries.len(),
            repeats: self.entries.iter().filter(|r| r.is_repeat).count(),
            mean_ms: total as f64 / self.entries.len() as f64,
            min_ms: times.clone().min().unwrap_or(0),
            max_ms: times.max().unwrap_or(0),
        })
    }

    /// Pretty JSON array mirroring [`TrialResult`]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// One row per glyph of every trial, trials numbered from 1. A trial
    /// whose stimulus set is empty still gets a row, with blank glyph columns.
    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.write_record(CSV_HEADER)?;

        for (i, result) in self.entries.iter().enumerate() {
            let base = CsvRow {
                trial: i + 1,
                is_repeat: result.is_repeat,
                elapsed_ms: result.elapsed_ms,
                stimulus_index: None,
                symbol: None,
                is_target: None,
                color: None,
                x: None,
                y: None,
            };
            if result.stimulus.is_empty() {
                wtr.serialize(base)?;
                continue;
            }
            for (idx, glyph) in result.stimulus.iter().enumerate() {
                wtr.serialize(CsvRow {
                    stimulus_index: Some(idx),
                    symbol: Some(glyph.symbol),
                    is_target: Some(glyph.is_target),
                    color: Some(&glyph.color),
                    x: Some(glyph.x),
                    y: Some(glyph.y),
                    ..base
                })?;
            }
        }

        let bytes = wtr
            .into_inner()
            .map_err(|e| ExportError::CsvBuffer(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ExportError::CsvBuffer(e.to_string()))
    }

    /// Writes the CSV table into `dir`. Nothing is written for an empty log.
    pub fn write_csv(&self, dir: &Path) -> Result<Option<PathBuf>> {
        if self.entries.is_empty() {
            info!("no results to export as CSV");
            return Ok(None);
        }
        let path = export_path(dir, "visual-search-results", "csv");
        fs::write(&path, self.to_csv()?)?;
        info!(path = %path.display(), rows = self.entries.len(), "results CSV written");
        Ok(Some(path))
    }

    /// Writes the JSON array into `dir`; an empty log produces `[]`
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf> {
        let path = export_path(dir, "visual-search-results", "json");
        fs::write(&path, self.to_json()?)?;
        info!(path = %path.display(), trials = self.entries.len(), "results JSON written");
        Ok(path)
    }
}

impl<'a> IntoIterator for &'a ResultsLog {
    type Item = &'a TrialResult;
    type IntoIter = std::slice::Iter<'a, TrialResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Configuration-only export
pub fn write_config(dir: &Path, config: &TrialConfig) -> Result<PathBuf> {
    let path = export_path(dir, "visual-search-config", "json");
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    info!(path = %path.display(), "config written");
    Ok(path)
}

/// `<dir>/<stem>-<unix millis>.<ext>`
pub fn export_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    dir.join(format!("{stem}-{millis}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vsearch_core::{GlyphPlacement, StimulusSet};

    fn result(elapsed_ms: u64, is_repeat: bool, glyphs: Vec<GlyphPlacement>) -> TrialResult {
        TrialResult {
            config: TrialConfig::default(),
            is_repeat,
            elapsed_ms,
            stimulus: Arc::new(StimulusSet::new(glyphs)),
        }
    }

    fn glyph(x: f32, y: f32, is_target: bool) -> GlyphPlacement {
        GlyphPlacement {
            x,
            y,
            is_target,
            color: "hsl(162, 73%, 46%)".into(),
            symbol: if is_target {
                Symbol::ForwardSlash
            } else {
                Symbol::BackSlash
            },
        }
    }

    fn sample_log() -> ResultsLog {
        let mut log = ResultsLog::new();
        log.push(result(
            640,
            false,
            vec![glyph(50.0, 60.5, false), glyph(200.0, 300.0, true)],
        ));
        log.push(result(512, true, vec![]));
        log
    }

    #[test]
    fn csv_has_one_row_per_glyph() {
        let csv = sample_log().to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], r#"1,false,640,0,\,false,"hsl(162, 73%, 46%)",50.0,60.5"#);
        assert_eq!(lines[2], r#"1,false,640,1,/,true,"hsl(162, 73%, 46%)",200.0,300.0"#);
        assert_eq!(lines[3], "2,true,512,,,,,,");
    }

    #[test]
    fn empty_log_csv_is_header_only() {
        let csv = ResultsLog::new().to_csv().unwrap();
        assert_eq!(csv.trim_end(), CSV_HEADER.join(","));
    }

    #[test]
    fn json_mirrors_results() {
        let log = sample_log();
        let value: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["elapsed_ms"], 640);
        assert_eq!(arr[1]["is_repeat"], true);
        assert_eq!(arr[0]["config"]["distractor_count"], 20);
        assert!(arr[0].get("stimulus").is_none());
        assert_eq!(ResultsLog::new().to_json().unwrap(), "[]");
    }

    #[test]
    fn exports_are_repeatable_and_non_destructive() {
        let log = sample_log();
        assert_eq!(log.to_csv().unwrap(), log.to_csv().unwrap());
        assert_eq!(log.to_json().unwrap(), log.to_json().unwrap());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn summary_reports_timing() {
        let s = sample_log().summary().unwrap();
        assert_eq!(s.trials, 2);
        assert_eq!(s.repeats, 1);
        assert_eq!(s.min_ms, 512);
        assert_eq!(s.max_ms, 640);
        assert!((s.mean_ms - 576.0).abs() < f64::EPSILON);
        assert!(ResultsLog::new().summary().is_none());
    }

    #[test]
    fn file_exports_follow_empty_log_policy() {
        let dir = tempfile::tempdir().unwrap();
        let empty = ResultsLog::new();
        assert!(empty.write_csv(dir.path()).unwrap().is_none());
        let json = empty.write_json(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(json).unwrap(), "[]");

        let log = sample_log();
        let csv = log.write_csv(dir.path()).unwrap().unwrap();
        assert!(csv.file_name().unwrap().to_string_lossy().starts_with("visual-search-results-"));
        assert_eq!(fs::read_to_string(csv).unwrap(), log.to_csv().unwrap());
    }

    #[test]
    fn config_export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrialConfig {
            glyph_size: 30,
            ..Default::default()
        };
        let path = write_config(dir.path(), &cfg).unwrap();
        let back: TrialConfig = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, cfg);
    }
}
