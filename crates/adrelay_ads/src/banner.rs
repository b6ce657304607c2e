//! Banner size and placement.

use serde::Deserialize;

/// Banner dimensions.
///
/// TOML: `size = "smart_banner"` or `size = { custom = { width = 320, height = 50 } }`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdSize {
    /// 320x50.
    Banner,
    /// 300x250.
    MediumRectangle,
    /// 468x60.
    IabBanner,
    /// 728x90.
    Leaderboard,
    /// Full screen width, height picked by the SDK.
    #[default]
    SmartBanner,
    /// Explicit size in density-independent pixels.
    Custom {
        /// Width.
        width: u32,
        /// Height.
        height: u32,
    },
}

impl AdSize {
    /// Fixed dimensions, or `None` when the SDK sizes the banner.
    #[must_use]
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            Self::Banner => Some((320, 50)),
            Self::MediumRectangle => Some((300, 250)),
            Self::IabBanner => Some((468, 60)),
            Self::Leaderboard => Some((728, 90)),
            Self::SmartBanner => None,
            Self::Custom { width, height } => Some((width, height)),
        }
    }
}

/// Where a banner is anchored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdPosition {
    /// Top center.
    Top,
    /// Bottom center.
    Bottom,
    /// Top left corner.
    TopLeft,
    /// Top right corner.
    TopRight,
    /// Bottom left corner.
    BottomLeft,
    /// Bottom right corner.
    BottomRight,
    /// Screen center.
    #[default]
    Center,
}

/// Size and position of a banner unit. Ignored for other kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BannerLayout {
    /// Banner size.
    pub size: AdSize,
    /// Banner anchor.
    pub position: AdPosition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let layout = BannerLayout::default();
        assert_eq!(layout.size, AdSize::SmartBanner);
        assert_eq!(layout.position, AdPosition::Center);
        assert_eq!(layout.size.dimensions(), None);
    }

    #[test]
    fn test_parse_named_and_custom_sizes() {
        let layout: BannerLayout = toml::from_str(r#"size = "leaderboard"
position = "bottom_right""#)
        .unwrap();
        assert_eq!(layout.size.dimensions(), Some((728, 90)));
        assert_eq!(layout.position, AdPosition::BottomRight);

        let layout: BannerLayout =
            toml::from_str("size = { custom = { width = 400, height = 60 } }").unwrap();
        assert_eq!(layout.size, AdSize::Custom { width: 400, height: 60 });
        assert_eq!(layout.position, AdPosition::Center);
    }
}
