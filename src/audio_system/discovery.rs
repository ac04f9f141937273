/// Sound file discovery
///
/// Finds the `action.<ext>` and `use.<ext>` files inside an item folder.
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extensions accepted for item sounds (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "ogg", "aif", "aiff", "flac"];

/// Sound role an item can override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Action,
    Use,
}

impl Slot {
    /// File stem the slot's sound must carry
    pub fn file_stem(&self) -> &'static str {
        match self {
            Slot::Action => "action",
            Slot::Use => "use",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Check whether a path has one of the supported audio extensions
pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Find the sound file for `slot` in `dir`.
///
/// The stem must equal the slot name exactly; the extension is matched
/// case-insensitively. Symlinked files count. The first match in listing
/// order wins. `Ok(None)` means the slot has no custom sound.
pub fn find_slot_file(dir: &Path, slot: Slot) -> io::Result<Option<PathBuf>> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        // Follows symlinks
        if !path.is_file() {
            continue;
        }

        let stem_matches = path
            .file_stem()
            .map(|stem| stem == slot.file_stem())
            .unwrap_or(false);

        if stem_matches && is_supported_audio(&path) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}
