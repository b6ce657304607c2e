//! Host environment an ad session runs in.

/// Where the app is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Inside the editor. Unit ids are empty and `play` grants a fixed reward.
    Editor,
    /// Android device.
    Android,
    /// iOS device.
    Ios,
    /// Anything else. Unit ids are empty.
    Other,
}

impl Platform {
    /// Platform of the compile target.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else {
            Self::Other
        }
    }
}

/// How the app was installed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InstallMode {
    /// Installed from a store. Forces real ads and disables test mode.
    Store,
    /// Side-loaded development build.
    Developer,
    /// Not known.
    #[default]
    Unknown,
}

/// Facts about the host that influence session behaviour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    /// Runtime platform.
    pub platform: Platform,
    /// Install source.
    pub install_mode: InstallMode,
    /// Debug build. On a device this forces test mode.
    pub debug_build: bool,
    /// Whether the app is in play mode. Only meaningful in the editor.
    pub playing: bool,
    /// Unique device id registered as test device while testing.
    pub device_id: Option<String>,
}

impl Environment {
    /// Editor environment.
    #[must_use]
    pub fn editor(playing: bool) -> Self {
        Self {
            platform: Platform::Editor,
            install_mode: InstallMode::Unknown,
            debug_build: true,
            playing,
            device_id: None,
        }
    }

    /// Device environment, always playing.
    #[must_use]
    pub fn device(platform: Platform, install_mode: InstallMode) -> Self {
        Self {
            platform,
            install_mode,
            debug_build: cfg!(debug_assertions),
            playing: true,
            device_id: None,
        }
    }

    /// Sets the device id.
    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Sets the debug-build flag.
    #[must_use]
    pub fn with_debug_build(mut self, debug_build: bool) -> Self {
        self.debug_build = debug_build;
        self
    }

    /// Whether this is the editor.
    #[inline]
    #[must_use]
    pub fn is_editor(&self) -> bool {
        self.platform == Platform::Editor
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::device(Platform::current(), InstallMode::Unknown)
    }
}
