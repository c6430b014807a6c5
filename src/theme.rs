use serde::{Deserialize, Serialize};

/// Color tag a node may carry. Rendering maps these to actual fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColor {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
}

impl NodeColor {
    pub const PALETTE: [NodeColor; 8] = [
        NodeColor::Default,
        NodeColor::Red,
        NodeColor::Orange,
        NodeColor::Yellow,
        NodeColor::Green,
        NodeColor::Blue,
        NodeColor::Purple,
        NodeColor::Pink,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        Self::PALETTE
            .iter()
            .copied()
            .find(|color| color.as_str() == token)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Pink => "pink",
        }
    }

    pub fn fill(self, mode: ThemeMode) -> &'static str {
        match (self, mode) {
            (Self::Default, ThemeMode::Light) => "#F8FAFF",
            (Self::Default, ThemeMode::Dark) => "#1C2430",
            (Self::Red, _) => "#F87171",
            (Self::Orange, _) => "#FB923C",
            (Self::Yellow, _) => "#FACC15",
            (Self::Green, _) => "#4ADE80",
            (Self::Blue, _) => "#60A5FA",
            (Self::Purple, _) => "#A78BFA",
            (Self::Pink, _) => "#F472B6",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}
