use log::{debug, warn};
use parking_lot::RwLock;
use std::sync::Arc;

use super::source::CaptionSource;
use crate::errors::ConstructionError;
use crate::language_utils::code_matches_prefix;

/// Position of a track in a `CaptionManager`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackId {
    Native(usize),
    Translated(usize),
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native(index) => write!(f, "n{}", index),
            Self::Translated(index) => write!(f, "t{}", index),
        }
    }
}

impl std::str::FromStr for TrackId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let mut chars = s.trim().chars();
        let kind = chars.next();
        let index: usize = chars
            .as_str()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid track id: {}", s))?;
        match kind {
            Some('n') => Ok(Self::Native(index)),
            Some('t') => Ok(Self::Translated(index)),
            _ => Err(anyhow::anyhow!("Invalid track id: {}", s)),
        }
    }
}

/// The caption tracks of one video and the policy for picking among them.
///
/// Native tracks are fixed at construction with the "off" sentinel first;
/// translated tracks are appended in batches and never removed.
#[derive(Debug)]
pub struct CaptionManager {
    native_tracks: Vec<Arc<CaptionSource>>,
    translated_tracks: RwLock<Vec<Arc<CaptionSource>>>,
}

impl CaptionManager {
    pub fn new(native_tracks: Vec<CaptionSource>) -> Self {
        let mut tracks = Vec::with_capacity(native_tracks.len() + 1);
        tracks.push(Arc::new(CaptionSource::disabled()));
        tracks.extend(native_tracks.into_iter().map(Arc::new));
        Self {
            native_tracks: tracks,
            translated_tracks: RwLock::new(Vec::new()),
        }
    }

    /// Native tracks, sentinel first
    pub fn native_tracks(&self) -> &[Arc<CaptionSource>] {
        &self.native_tracks
    }

    /// Snapshot of the translated tracks
    pub fn translated_tracks(&self) -> Vec<Arc<CaptionSource>> {
        self.translated_tracks.read().clone()
    }

    /// All tracks with their ids, natives first
    pub fn tracks(&self) -> Vec<(TrackId, Arc<CaptionSource>)> {
        let native = self
            .native_tracks
            .iter()
            .enumerate()
            .map(|(i, source)| (TrackId::Native(i), source.clone()));
        let translated = self
            .translated_tracks
            .read()
            .iter()
            .enumerate()
            .map(|(i, source)| (TrackId::Translated(i), source.clone()))
            .collect::<Vec<_>>();
        native.chain(translated).collect()
    }

    pub fn get(&self, id: TrackId) -> Option<Arc<CaptionSource>> {
        match id {
            TrackId::Native(index) => self.native_tracks.get(index).cloned(),
            TrackId::Translated(index) => self.translated_tracks.read().get(index).cloned(),
        }
    }

    /// The off sentinel
    pub fn disabled(&self) -> Arc<CaptionSource> {
        self.native_tracks[0].clone()
    }

    /// Native track whose language starts with `code`, preferring authored over auto-generated
    pub fn get_by_language(&self, code: &str) -> Option<Arc<CaptionSource>> {
        self.find_native(code, false)
            .or_else(|| {
                debug!("Native non-ASR caption for {} not found", code);
                self.find_native(code, true)
            })
    }

    /// Best available track for `code`: native authored, then native
    /// auto-generated, then free translated. Paid tracks are never returned.
    pub fn search(&self, code: &str) -> Option<Arc<CaptionSource>> {
        let found = self
            .find_native(code, false)
            .or_else(|| self.find_native(code, true))
            .or_else(|| {
                self.translated_tracks
                    .read()
                    .iter()
                    .find(|source| !source.is_paid() && code_matches_prefix(source.language_code(), code))
                    .cloned()
            });

        match &found {
            Some(source) => debug!("Looking for {}, found {}", code, source),
            None => debug!("Looking for {}, not found", code),
        }
        found
    }

    fn find_native(&self, code: &str, auto_generated: bool) -> Option<Arc<CaptionSource>> {
        self.native_tracks
            .iter()
            .filter(|source| !source.is_disabled())
            .find(|source| {
                source.is_auto_generated() == auto_generated
                    && code_matches_prefix(source.language_code(), code)
            })
            .cloned()
    }

    /// Append a batch of translated tracks, skipping the ones that failed to construct.
    ///
    /// # Returns
    /// * `Vec<TrackId>` - Ids of the tracks actually added
    pub fn add_translated(&self, batch: Vec<Result<CaptionSource, ConstructionError>>) -> Vec<TrackId> {
        let mut tracks = self.translated_tracks.write();
        let mut added = Vec::new();
        for entry in batch {
            match entry {
                Ok(source) => {
                    added.push(TrackId::Translated(tracks.len()));
                    tracks.push(Arc::new(source));
                }
                Err(e) => warn!("Skipping translated caption: {}", e),
            }
        }
        added
    }
}
