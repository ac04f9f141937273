/// Item sound registry
///
/// Maps item ids to their custom sounds and playback state. Entries come from
/// the startup folder scan or from explicit add/set calls; every loaded sound
/// is released again when its entry is removed or the registry is dropped.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;

use serde::Serialize;

use crate::audio_system::{
    find_slot_file, AudioBackend, FadeScheduler, PlaybackController, PlaybackSettings, Slot,
    SoundEntry, SoundHandle,
};
use crate::catalog::{ItemId, ItemInfo, ItemLookup};
use crate::error::RegistryError;
use crate::outcome::{Outcome, OutcomeResult};

/// How a registry call names its item
#[derive(Debug, Clone, Copy)]
pub enum ItemRef<'a> {
    /// Item id
    Id(ItemId),

    /// Numeric id, raw name or display name, resolved through the lookup
    Text(&'a str),

    /// Already resolved item
    Item(&'a ItemInfo),
}

impl From<ItemId> for ItemRef<'_> {
    fn from(id: ItemId) -> Self {
        ItemRef::Id(id)
    }
}

impl<'a> From<&'a str> for ItemRef<'a> {
    fn from(text: &'a str) -> Self {
        ItemRef::Text(text)
    }
}

impl<'a> From<&'a String> for ItemRef<'a> {
    fn from(text: &'a String) -> Self {
        ItemRef::Text(text)
    }
}

impl<'a> From<&'a ItemInfo> for ItemRef<'a> {
    fn from(item: &'a ItemInfo) -> Self {
        ItemRef::Item(item)
    }
}

/// Where an add/set call takes its sounds from
#[derive(Debug, Clone, Copy)]
pub enum SoundSource<'a> {
    /// Item folder holding `action.<ext>` and/or `use.<ext>`
    Directory(&'a Path),

    /// Explicit files; `None` (or an empty path) means no sound for that slot
    Files {
        action: Option<&'a Path>,
        use_: Option<&'a Path>,
    },

    /// Sounds the caller already loaded. Ownership passes to the registry
    /// when the entry is stored.
    Handles {
        action: Option<SoundHandle>,
        use_: Option<SoundHandle>,
    },
}

/// Whether the host should play its own sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundOverride {
    /// A custom sound was played in place of the default
    Custom,

    /// No override, play the default sound
    Default,
}

/// Item registered (or rejected) during a scan
#[derive(Debug, Clone, Serialize)]
pub struct ScannedItem {
    pub folder: String,
    pub item: ItemInfo,
    pub outcome: OutcomeResult,
}

/// Why a folder was skipped during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    UnknownItem,
    AlreadyRegistered(ItemId),
    Unreadable(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFolder {
    pub folder: String,
    pub reason: SkipReason,
}

/// Diagnostics of a folder scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Items stored with at least one sound
    pub registered: Vec<ScannedItem>,
    /// Items resolved but with neither sound loaded
    pub rejected: Vec<ScannedItem>,
    pub skipped: Vec<SkippedFolder>,
}

/// Item sound registry
pub struct SoundRegistry {
    backend: Rc<dyn AudioBackend>,
    lookup: Box<dyn ItemLookup>,
    settings: Rc<PlaybackSettings>,
    fades: Rc<RefCell<FadeScheduler>>,
    entries: HashMap<ItemId, PlaybackController>,
}

impl SoundRegistry {
    /// Create an empty registry
    pub fn new(
        backend: Rc<dyn AudioBackend>,
        lookup: impl ItemLookup + 'static,
        settings: PlaybackSettings,
    ) -> Self {
        Self {
            backend,
            lookup: Box::new(lookup),
            settings: Rc::new(settings),
            fades: Rc::new(RefCell::new(FadeScheduler::new())),
            entries: HashMap::with_capacity(64),
        }
    }

    /// Resolve any addressing form to an item id
    pub fn resolve<'a>(&self, item: impl Into<ItemRef<'a>>) -> Option<ItemId> {
        match item.into() {
            ItemRef::Id(id) => Some(id),
            ItemRef::Item(info) => Some(info.id),
            ItemRef::Text(text) => self.lookup.find(text).map(|info| info.id),
        }
    }

    /// Add sounds for an item that has none yet.
    ///
    /// Fails with `ErrAlreadyExists` on an existing entry (before any file is
    /// touched) and stores nothing unless at least one slot loads.
    pub fn add<'a>(&mut self, item: impl Into<ItemRef<'a>>, source: SoundSource<'_>) -> OutcomeResult {
        let Some(id) = self.resolve(item) else {
            return OutcomeResult::both(Outcome::ErrUnknownItem);
        };
        if Self::is_empty_handle_pair(&source) {
            return OutcomeResult::both(Outcome::Empty);
        }
        if self.entries.contains_key(&id) {
            return OutcomeResult::both(Outcome::ErrAlreadyExists);
        }

        let (entry, outcome) = self.build_entry(&source);
        if outcome.any_success() {
            self.insert(id, entry);
        }
        outcome
    }

    /// Like [`add`](Self::add) but replaces an existing entry.
    ///
    /// The replaced entry's sounds are released unless the new entry reuses
    /// them. A call where no slot loads leaves the existing entry untouched.
    pub fn set<'a>(&mut self, item: impl Into<ItemRef<'a>>, source: SoundSource<'_>) -> OutcomeResult {
        let Some(id) = self.resolve(item) else {
            return OutcomeResult::both(Outcome::ErrUnknownItem);
        };
        if Self::is_empty_handle_pair(&source) {
            return OutcomeResult::both(Outcome::Empty);
        }

        let (entry, outcome) = self.build_entry(&source);
        if outcome.any_success() {
            if let Some(previous) = self.insert(id, entry) {
                let kept: Vec<SoundHandle> = entry.handles().collect();
                for sound in previous.entry().handles().filter(|h| !kept.contains(h)) {
                    self.backend.release_sound(sound);
                }
                tracing::debug!("Replaced sound effects of item {}", id);
            }
        }
        outcome
    }

    /// Remove an item's entry and release its sounds. Returns whether an
    /// entry existed.
    pub fn remove<'a>(&mut self, item: impl Into<ItemRef<'a>>) -> bool {
        let Some(id) = self.resolve(item) else {
            return false;
        };

        match self.entries.remove(&id) {
            Some(controller) => {
                self.release_entry(controller.entry());
                true
            }
            None => false,
        }
    }

    /// Custom sounds of an item; `None` means the host keeps its defaults
    pub fn get<'a>(&self, item: impl Into<ItemRef<'a>>) -> Option<&PlaybackController> {
        let id = self.resolve(item)?;
        self.entries.get(&id)
    }

    pub fn contains<'a>(&self, item: impl Into<ItemRef<'a>>) -> bool {
        self.get(item).is_some()
    }

    /// Number of registered items
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered item ids, sorted
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// Register every item folder under `root`, creating `root` if missing.
    ///
    /// Folders are visited in listing order and handled independently:
    /// unknown items, items already registered and unreadable folders are
    /// skipped with a warning. Only a missing/unlistable root is an error.
    pub fn scan_directory(&mut self, root: &Path) -> Result<ScanReport, RegistryError> {
        if !root.exists() {
            fs::create_dir_all(root).map_err(|e| RegistryError::RootCreationFailed {
                path: root.display().to_string(),
                source: e,
            })?;
            tracing::info!("{} does not exist, created folder", root.display());
        }

        let listing = fs::read_dir(root).map_err(|e| RegistryError::RootUnreadable {
            path: root.display().to_string(),
            source: e,
        })?;

        let mut report = ScanReport::default();
        for dir_entry in listing {
            let dir_entry = match dir_entry {
                Ok(dir_entry) => dir_entry,
                Err(e) => {
                    tracing::error!("Error while listing {}: {}", root.display(), e);
                    report.skipped.push(SkippedFolder {
                        folder: root.display().to_string(),
                        reason: SkipReason::Unreadable(e.to_string()),
                    });
                    continue;
                }
            };

            let folder = dir_entry.file_name().to_string_lossy().into_owned();
            let path = dir_entry.path();
            match fs::metadata(&path) {
                Ok(metadata) if metadata.is_dir() => {}
                Ok(_) => {
                    tracing::debug!("Ignoring {}: not a folder", folder);
                    continue;
                }
                Err(e) => {
                    tracing::error!("Error while registering sound effects of {}: {}", folder, e);
                    report.skipped.push(SkippedFolder {
                        folder,
                        reason: SkipReason::Unreadable(e.to_string()),
                    });
                    continue;
                }
            }

            self.scan_item_folder(&path, folder, &mut report);
        }

        tracing::info!(
            "Scanned {}: {} registered, {} rejected, {} skipped",
            root.display(),
            report.registered.len(),
            report.rejected.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Advance running fade-outs; call once per frame
    pub fn update(&self, delta_seconds: f32) {
        self.fades.borrow_mut().tick(self.backend.as_ref(), delta_seconds);
    }

    /// Number of fade-outs still running
    pub fn active_fades(&self) -> usize {
        self.fades.borrow().active_count()
    }

    /// Host asks for an item's action sound
    pub fn on_action_sound<'a>(&self, item: impl Into<ItemRef<'a>>) -> SoundOverride {
        match self.get(item) {
            Some(controller) if !controller.uses_default(Slot::Action) => {
                controller.play_action();
                SoundOverride::Custom
            }
            _ => SoundOverride::Default,
        }
    }

    /// Host asks for an item's use sound
    pub fn on_use_sound<'a>(&self, item: impl Into<ItemRef<'a>>) -> SoundOverride {
        match self.get(item) {
            Some(controller) if !controller.uses_default(Slot::Use) => {
                controller.play_use();
                SoundOverride::Custom
            }
            _ => SoundOverride::Default,
        }
    }

    /// Host stops an item's sound; the host's own stop still runs
    pub fn on_stop_sound<'a>(&self, item: impl Into<ItemRef<'a>>) {
        if let Some(controller) = self.get(item) {
            controller.fade_stop();
        }
    }

    /// Drop every entry, cut running fades and release all sounds
    pub fn clear(&mut self) {
        self.fades.borrow_mut().stop_all(self.backend.as_ref());
        let entries: Vec<PlaybackController> = self.entries.drain().map(|(_, c)| c).collect();
        for controller in &entries {
            self.release_entry(controller.entry());
        }
        tracing::debug!("Cleared {} item sound effect(s)", entries.len());
    }

    fn scan_item_folder(&mut self, dir: &Path, folder: String, report: &mut ScanReport) {
        let Some(item) = self.lookup.find(&folder) else {
            tracing::warn!("Item not found: {}", folder);
            report.skipped.push(SkippedFolder {
                folder,
                reason: SkipReason::UnknownItem,
            });
            return;
        };

        if self.entries.contains_key(&item.id) {
            tracing::warn!("Item already registered: {} - {}", folder, item.name);
            report.skipped.push(SkippedFolder {
                folder,
                reason: SkipReason::AlreadyRegistered(item.id),
            });
            return;
        }

        let (entry, outcome) = self.load_directory(dir);
        let scanned = ScannedItem {
            folder,
            item,
            outcome,
        };

        if outcome.any_success() {
            self.insert(scanned.item.id, entry);
            tracing::info!(
                "Registered item: {} - {}: {}",
                scanned.folder,
                scanned.item.display_name,
                outcome
            );
            report.registered.push(scanned);
        } else {
            tracing::warn!(
                "No usable sound for item: {} - {}: {}",
                scanned.folder,
                scanned.item.display_name,
                outcome
            );
            report.rejected.push(scanned);
        }
    }

    fn is_empty_handle_pair(source: &SoundSource<'_>) -> bool {
        matches!(
            source,
            SoundSource::Handles {
                action: None,
                use_: None
            }
        )
    }

    fn build_entry(&self, source: &SoundSource<'_>) -> (SoundEntry, OutcomeResult) {
        match *source {
            SoundSource::Directory(dir) => self.load_directory(dir),
            SoundSource::Files { action, use_ } => {
                let (action, action_outcome) = self.load_optional_file(Slot::Action, action);
                let (use_, use_outcome) = self.load_optional_file(Slot::Use, use_);
                (
                    SoundEntry::new(action, use_),
                    OutcomeResult::new(action_outcome, use_outcome),
                )
            }
            SoundSource::Handles { action, use_ } => {
                let outcome_of = |handle: Option<SoundHandle>| {
                    if handle.is_some() {
                        Outcome::Ok
                    } else {
                        Outcome::Empty
                    }
                };
                (
                    SoundEntry::new(action, use_),
                    OutcomeResult::new(outcome_of(action), outcome_of(use_)),
                )
            }
        }
    }

    fn load_directory(&self, dir: &Path) -> (SoundEntry, OutcomeResult) {
        let (action, action_outcome) = self.load_slot_from_directory(dir, Slot::Action);
        let (use_, use_outcome) = self.load_slot_from_directory(dir, Slot::Use);
        (
            SoundEntry::new(action, use_),
            OutcomeResult::new(action_outcome, use_outcome),
        )
    }

    fn load_slot_from_directory(&self, dir: &Path, slot: Slot) -> (Option<SoundHandle>, Outcome) {
        match find_slot_file(dir, slot) {
            Ok(Some(path)) => self.load_file(slot, &path),
            Ok(None) => (None, Outcome::ErrFileNotFound),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Sound folder not found: {}", dir.display());
                (None, Outcome::ErrFileNotFound)
            }
            Err(e) => {
                tracing::error!("Failed to list {} for the {} sound: {}", dir.display(), slot, e);
                (None, Outcome::ErrUnknown)
            }
        }
    }

    fn load_optional_file(&self, slot: Slot, path: Option<&Path>) -> (Option<SoundHandle>, Outcome) {
        match path {
            Some(path) if !path.as_os_str().is_empty() => self.load_file(slot, path),
            _ => (None, Outcome::Empty),
        }
    }

    /// A failed load never leaves a handle behind
    fn load_file(&self, slot: Slot, path: &Path) -> (Option<SoundHandle>, Outcome) {
        match self.backend.load_sound(path, self.settings.load_mode) {
            Ok(sound) => (Some(sound), Outcome::Ok),
            Err(e) => {
                tracing::warn!("Failed to load {} sound {}: {}", slot, path.display(), e);
                (None, Outcome::from(&e))
            }
        }
    }

    fn insert(&mut self, id: ItemId, entry: SoundEntry) -> Option<PlaybackController> {
        let controller = PlaybackController::new(
            entry,
            self.backend.clone(),
            self.fades.clone(),
            self.settings.clone(),
        );
        self.entries.insert(id, controller)
    }

    fn release_entry(&self, entry: &SoundEntry) {
        for sound in entry.handles() {
            self.backend.release_sound(sound);
        }
    }
}

impl Drop for SoundRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}
