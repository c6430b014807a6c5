use crate::model::LayoutMode;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Approximate on-canvas size every node is treated as having.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FootprintConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            width: 150.0,
            height: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadialConfig {
    pub radius: f32,
    /// Lower bound on the number of angular slots, so few children spread wide.
    pub min_slots: usize,
    pub start_angle_deg: f32,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            radius: 200.0,
            min_slots: 6,
            start_angle_deg: -90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TieredConfig {
    pub vertical_offset: f32,
    pub horizontal_gap: f32,
}

impl Default for TieredConfig {
    fn default() -> Self {
        Self {
            vertical_offset: 150.0,
            horizontal_gap: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StackedConfig {
    pub horizontal_offset: f32,
    pub vertical_gap: f32,
}

impl Default for StackedConfig {
    fn default() -> Self {
        Self {
            horizontal_offset: 250.0,
            vertical_gap: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementConfig {
    pub radial: RadialConfig,
    pub tiered: TieredConfig,
    pub stacked: StackedConfig,
    pub sibling_offset_x: f32,
    pub sibling_offset_y: f32,
    pub duplicate_offset_x: f32,
    pub duplicate_offset_y: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            radial: RadialConfig::default(),
            tiered: TieredConfig::default(),
            stacked: StackedConfig::default(),
            sibling_offset_x: 0.0,
            sibling_offset_y: 100.0,
            duplicate_offset_x: 40.0,
            duplicate_offset_y: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollisionConfig {
    pub padding: f32,
    pub max_passes: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            padding: 20.0,
            max_passes: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankSpacing {
    pub rank_spacing: f32,
    pub node_spacing: f32,
}

impl Default for RankSpacing {
    fn default() -> Self {
        Self {
            rank_spacing: 120.0,
            node_spacing: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoLayoutConfig {
    pub mindmap: RankSpacing,
    pub orgchart: RankSpacing,
    pub logic: RankSpacing,
    pub margin: f32,
    /// Median-sweep passes used by the fallback layered layout.
    pub ordering_passes: usize,
}

impl Default for AutoLayoutConfig {
    fn default() -> Self {
        Self {
            mindmap: RankSpacing::default(),
            orgchart: RankSpacing {
                rank_spacing: 100.0,
                node_spacing: 60.0,
            },
            logic: RankSpacing {
                rank_spacing: 150.0,
                node_spacing: 30.0,
            },
            margin: 20.0,
            ordering_passes: 4,
        }
    }
}

impl AutoLayoutConfig {
    pub fn spacing(&self, mode: LayoutMode) -> RankSpacing {
        match mode {
            LayoutMode::Mindmap => self.mindmap,
            LayoutMode::Orgchart => self.orgchart,
            LayoutMode::Logic => self.logic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub footprint: FootprintConfig,
    pub placement: PlacementConfig,
    pub collision: CollisionConfig,
    pub auto_layout: AutoLayoutConfig,
    pub history_limit: usize,
    pub autosave_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            footprint: FootprintConfig::default(),
            placement: PlacementConfig::default(),
            collision: CollisionConfig::default(),
            auto_layout: AutoLayoutConfig::default(),
            history_limit: 50,
            autosave_delay_ms: 500,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let mut config: EditorConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))?;
    if config.history_limit == 0 {
        anyhow::bail!("historyLimit must be at least 1");
    }
    config.collision.max_passes = config.collision.max_passes.max(1);
    config.placement.radial.min_slots = config.placement.radial.min_slots.max(1);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"placement":{"radial":{"radius":320.0}}}"#).unwrap();
        assert_eq!(config.placement.radial.radius, 320.0);
        assert_eq!(config.placement.radial.min_slots, 6);
        assert_eq!(config.placement.tiered.horizontal_gap, 200.0);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn load_config_without_path_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.collision.max_passes, 20);
        assert_eq!(config.footprint.width, 150.0);
    }

    #[test]
    fn load_config_rejects_zero_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(&path, r#"{"historyLimit":0}"#).unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("historyLimit"));
    }

    #[test]
    fn load_config_reads_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(
            &path,
            r#"{"autosaveDelayMs":250,"collision":{"maxPasses":0},"autoLayout":{"margin":8.0}}"#,
        )
        .unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.autosave_delay_ms, 250);
        assert_eq!(config.collision.max_passes, 1);
        assert_eq!(config.auto_layout.margin, 8.0);
    }

    #[test]
    fn load_config_names_the_file_on_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
