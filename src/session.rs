/*!
 * Per-video caption session.
 *
 * A `CaptionSession` owns the `CaptionManager` for one manifest, builds the
 * translated tracks from the English pivot, and keeps the primary and
 * secondary selections. It is created when a video loads and dropped when
 * the next one replaces it.
 */

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::app_config::Settings;
use crate::captions::catalog::{self, PIVOT_LANGUAGE};
use crate::captions::{CaptionLine, CaptionManager, CaptionSource, RemoteTranslator, TrackId, TranscriptFetcher};
use crate::manifest::Manifest;
use crate::providers::Vendor;

/// Which of the two overlay rows a track is shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Primary,
    Secondary,
}

/// Currently selected tracks
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub primary: Option<Arc<CaptionSource>>,
    pub secondary: Option<Arc<CaptionSource>>,
}

#[derive(Debug)]
pub struct CaptionSession {
    video_id: Option<String>,
    settings: Settings,
    manager: CaptionManager,
    translator: Arc<dyn RemoteTranslator>,
    selection: RwLock<Selection>,
}

impl CaptionSession {
    /// Build the session for `manifest`; fails when the manifest has no caption list
    pub fn from_manifest(
        manifest: &Manifest,
        settings: Settings,
        fetcher: Arc<dyn TranscriptFetcher>,
        translator: Arc<dyn RemoteTranslator>,
    ) -> Result<Self> {
        let native = manifest.native_sources(fetcher)?;
        info!(
            "Manifest {} with {} caption tracks",
            manifest.video_id().unwrap_or("<unknown>"),
            native.len()
        );

        Ok(Self {
            video_id: manifest.video_id().map(str::to_string),
            settings,
            manager: CaptionManager::new(native),
            translator,
            selection: RwLock::new(Selection::default()),
        })
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn manager(&self) -> &CaptionManager {
        &self.manager
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Download the English pivot and append the translated batches enabled in settings.
    ///
    /// # Returns
    /// * `Result<usize>` - Number of translated tracks added
    pub async fn build_translations(&self) -> Result<usize> {
        let pivot = self
            .manager
            .get_by_language(PIVOT_LANGUAGE)
            .ok_or_else(|| anyhow!("No English caption to translate from"))?;
        info!("English = {}", pivot);

        pivot
            .download()
            .await
            .context("Failed to download the English caption")?;

        let mut added = 0;
        if self.settings.yt_trans_enabled {
            added += self.manager.add_translated(catalog::platform_batch(&pivot)).len();
        }
        for vendor in Vendor::ALL {
            if self.settings.vendor_enabled(vendor) {
                added += self
                    .manager
                    .add_translated(catalog::vendor_batch(vendor, &pivot, self.translator.clone()))
                    .len();
            }
        }

        info!("Added {} translated tracks", added);
        Ok(added)
    }

    /// Pick the first track found for each search-code list and start its download
    pub fn auto_select(&self) -> Selection {
        let primary = self.search_first(&self.settings.primary_caption_search_codes);
        let secondary = self.search_first(&self.settings.secondary_caption_search_codes);

        let mut selection = self.selection.write();
        selection.primary = primary;
        selection.secondary = secondary;
        selection.clone()
    }

    fn search_first(&self, codes: &[String]) -> Option<Arc<CaptionSource>> {
        let source = codes.iter().find_map(|code| self.manager.search(code))?;
        // The download is spawned on first call; the handle is not needed here
        drop(source.download());
        Some(source)
    }

    /// Build translations, then auto-select; a failed build still selects among native tracks
    pub async fn start(&self) -> Selection {
        if let Err(e) = self.build_translations().await {
            warn!("Translated captions unavailable: {:#}", e);
        }
        self.auto_select()
    }

    /// Explicitly show track `id` in `slot`; the only way to reach paid tracks
    pub fn select(&self, slot: Slot, id: TrackId) -> Option<Arc<CaptionSource>> {
        let source = self.manager.get(id)?;
        drop(source.download());

        let mut selection = self.selection.write();
        match slot {
            Slot::Primary => selection.primary = Some(source.clone()),
            Slot::Secondary => selection.secondary = Some(source.clone()),
        }
        info!("Selected {} as {:?}", source, slot);
        Some(source)
    }

    pub fn selection(&self) -> Selection {
        self.selection.read().clone()
    }

    /// Lines on screen at `time` for the primary and secondary rows
    pub fn active_lines(&self, time: f64) -> (Vec<CaptionLine>, Vec<CaptionLine>) {
        let selection = self.selection.read();
        let lines = |source: &Option<Arc<CaptionSource>>| {
            source
                .as_ref()
                .map(|source| source.active_lines(time))
                .unwrap_or_default()
        };
        (lines(&selection.primary), lines(&selection.secondary))
    }
}
