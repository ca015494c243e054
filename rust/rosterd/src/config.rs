use crate::db;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub const SETTINGS_KEY: &str = "view_config";
pub const ITEMS_PER_PAGE_ENV: &str = "ROSTERD_ITEMS_PER_PAGE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    pub items_per_page: usize,
    pub seed_demo_data: bool,
    pub enforce_unique_groups: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            items_per_page: 5,
            seed_demo_data: true,
            enforce_unique_groups: true,
        }
    }
}

impl ViewConfig {
    /// Defaults with the page-size environment override applied.
    pub fn from_env() -> ViewConfig {
        let mut cfg = ViewConfig::default();
        if let Some(n) = std::env::var(ITEMS_PER_PAGE_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
        {
            cfg.items_per_page = n;
        }
        cfg
    }

    /// Workspace settings layered over `base`; missing keys keep `base` values.
    pub fn load(conn: &Connection, base: &ViewConfig) -> anyhow::Result<ViewConfig> {
        match db::settings_get_json(conn, SETTINGS_KEY)? {
            Some(stored) => {
                let patch = stored.as_object().cloned().unwrap_or_default();
                base.apply_patch(&patch).map_err(anyhow::Error::msg)
            }
            None => Ok(base.clone()),
        }
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        db::settings_set_json(conn, SETTINGS_KEY, &serde_json::to_value(self)?)
    }

    pub fn apply_patch(
        &self,
        patch: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<ViewConfig, String> {
        let mut base = serde_json::to_value(self).map_err(|e| e.to_string())?;
        if let Some(obj) = base.as_object_mut() {
            for (k, v) in patch {
                if !obj.contains_key(k) {
                    return Err(format!("unknown config key: {}", k));
                }
                obj.insert(k.clone(), v.clone());
            }
        }
        let next: ViewConfig = serde_json::from_value(base).map_err(|e| e.to_string())?;
        if next.items_per_page == 0 {
            return Err("itemsPerPage must be at least 1".into());
        }
        Ok(next)
    }
}
