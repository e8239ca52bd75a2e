//! Player preferences
//!
//! Saved with the session snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sim::Rarity;

/// Game preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Auto-sell toggle per rarity. Displayed and saved, but pulls of a new
    /// unit are unlocked regardless of it.
    pub auto_sell: BTreeMap<Rarity, bool>,
    /// Start the wave as soon as prep begins
    #[serde(default)]
    pub auto_skip_prep: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_sell: Rarity::ALL.into_iter().map(|r| (r, false)).collect(),
            auto_skip_prep: false,
        }
    }
}

impl Preferences {
    pub fn auto_sell(&self, rarity: Rarity) -> bool {
        self.auto_sell.get(&rarity).copied().unwrap_or(false)
    }

    /// Flip the auto-sell toggle for `rarity`, returning the new value
    pub fn toggle_auto_sell(&mut self, rarity: Rarity) -> bool {
        let entry = self.auto_sell.entry(rarity).or_insert(false);
        *entry = !*entry;
        *entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_all_off() {
        let prefs = Preferences::default();
        assert!(Rarity::ALL.iter().all(|r| !prefs.auto_sell(*r)));
        assert!(!prefs.auto_skip_prep);
    }

    #[test]
    fn test_toggle_auto_sell() {
        let mut prefs = Preferences::default();
        assert!(prefs.toggle_auto_sell(Rarity::Epic));
        assert!(prefs.auto_sell(Rarity::Epic));
        assert!(!prefs.toggle_auto_sell(Rarity::Epic));
        assert!(!prefs.auto_sell(Rarity::Common));
    }

    #[test]
    fn test_json_roundtrip_keys() {
        let mut prefs = Preferences::default();
        prefs.toggle_auto_sell(Rarity::Mythic);
        prefs.auto_skip_prep = true;
        let json = serde_json::to_string(&prefs).unwrap();
        assert!(json.contains("\"Mythic\":true"));
        let back: Preferences = serde_json::from_str(&json).unwrap();
        assert_eq!(back, prefs);
    }
}
