//! Cheap, one-shot estimate of how many files a session will index.
//!
//! The number only feeds the progress percentage. It is computed once per
//! session from a small breadth-first sample and never corrected mid-walk.

use super::{CancellationToken, IgnoreRules};
use crate::config::EstimatorSettings;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Counts collected from one sampled directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DirSample {
    files: usize,
    child_dirs: usize,
}

pub struct FileEstimator {
    settings: EstimatorSettings,
    rules: IgnoreRules,
}

impl FileEstimator {
    pub fn new(settings: EstimatorSettings, rules: IgnoreRules) -> Self {
        Self { settings, rules }
    }

    /// Estimates the total number of indexable files under `roots`.
    ///
    /// `avg_files_per_dir * estimated_total_dirs`, floored at
    /// `min_estimated_files`. Falls back to `fallback_files` when nothing could
    /// be sampled (no readable roots, or cancelled before the first listing).
    pub fn estimate(&self, roots: &[PathBuf], token: &CancellationToken) -> usize {
        let sample_limit = self
            .settings
            .file_sample_dirs
            .max(self.settings.dir_sample_dirs);
        let samples = self.sample(roots, sample_limit, token);

        let file_samples = &samples[..samples.len().min(self.settings.file_sample_dirs)];
        if file_samples.is_empty() {
            tracing::debug!("No directories sampled, using fallback estimate");
            return self.settings.fallback_files;
        }

        let files_seen: usize = file_samples.iter().map(|s| s.files).sum();
        let avg_files_per_dir = files_seen as f64 / file_samples.len() as f64;
        let estimated_dirs = self.estimate_dir_count(&samples);

        let estimate = (avg_files_per_dir * estimated_dirs as f64) as usize;
        let estimate = estimate.max(self.settings.min_estimated_files);
        tracing::debug!(
            "Sampled {} dirs ({} files), ~{} dirs total, ~{} files",
            file_samples.len(),
            files_seen,
            estimated_dirs,
            estimate
        );
        estimate
    }

    /// `avg_child_dirs_per_dir * dir_scale_factor` over the smaller sample.
    fn estimate_dir_count(&self, samples: &[DirSample]) -> usize {
        let dir_samples = &samples[..samples.len().min(self.settings.dir_sample_dirs)];
        if dir_samples.is_empty() {
            return self.settings.fallback_dirs;
        }
        let child_dirs: usize = dir_samples.iter().map(|s| s.child_dirs).sum();
        let avg_child_dirs = child_dirs as f64 / dir_samples.len() as f64;
        let scaled = (avg_child_dirs * self.settings.dir_scale_factor as f64) as usize;
        scaled.max(self.settings.min_estimated_dirs)
    }

    /// Lists up to `limit` directories breadth-first across all roots.
    /// Unreadable directories are skipped and do not count toward the limit.
    fn sample(&self, roots: &[PathBuf], limit: usize, token: &CancellationToken) -> Vec<DirSample> {
        let mut samples = Vec::with_capacity(limit);
        let mut queue: VecDeque<PathBuf> = roots.iter().cloned().collect();

        while let Some(dir) = queue.pop_front() {
            if samples.len() >= limit || token.is_cancelled() {
                break;
            }
            if let Some((sample, children)) = self.list_dir(&dir, token) {
                samples.push(sample);
                queue.extend(children);
            }
        }
        samples
    }

    /// `None` when `dir` is unreadable or `token` fires mid-listing.
    fn list_dir(
        &self,
        dir: &Path,
        token: &CancellationToken,
    ) -> Option<(DirSample, Vec<PathBuf>)> {
        // An unreadable root surfaces as an error on the first item.
        let mut listing = WalkDir::new(dir)
            .follow_links(false)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .peekable();
        if let Some(Err(e)) = listing.peek() {
            tracing::trace!("Skipping unreadable directory {:?}: {}", dir, e);
            return None;
        }

        let mut sample = DirSample::default();
        let mut children = Vec::new();
        for entry in listing.filter_map(Result::ok) {
            if token.is_cancelled() {
                return None;
            }
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() {
                if !self.rules.is_hidden_dir(&name) {
                    sample.child_dirs += 1;
                    children.push(entry.into_path());
                }
            } else if !self.rules.is_hidden_file(&name) {
                sample.files += 1;
            }
        }
        Some((sample, children))
    }
}
