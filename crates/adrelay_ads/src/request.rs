//! Load requests handed to the SDK backend.

use crate::banner::BannerLayout;
use crate::kind::AdKind;

/// Test device id the SDK uses for its simulator.
pub const TEST_DEVICE_SIMULATOR: &str = "SIMULATOR";

/// The ad unit a backend should create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdUnit {
    /// Ad kind.
    pub kind: AdKind,
    /// Resolved unit id. Empty in the editor.
    pub unit_id: String,
    /// Layout, present for banners only.
    pub banner: Option<BannerLayout>,
}

/// Targeting for a single load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdRequest {
    test_devices: Vec<String>,
}

impl AdRequest {
    /// Starts a request.
    #[must_use]
    pub fn builder() -> AdRequestBuilder {
        AdRequestBuilder::default()
    }

    /// Devices registered for test ads.
    #[must_use]
    pub fn test_devices(&self) -> &[String] {
        &self.test_devices
    }

    /// Whether any test device is registered.
    #[must_use]
    pub fn is_test(&self) -> bool {
        !self.test_devices.is_empty()
    }
}

/// Builder for [`AdRequest`].
#[derive(Debug, Default)]
pub struct AdRequestBuilder {
    test_devices: Vec<String>,
}

impl AdRequestBuilder {
    /// Registers a test device. Duplicates are ignored.
    #[must_use]
    pub fn test_device(mut self, device: impl Into<String>) -> Self {
        let device = device.into();
        if !self.test_devices.contains(&device) {
            self.test_devices.push(device);
        }
        self
    }

    /// Finishes the request.
    #[must_use]
    pub fn build(self) -> AdRequest {
        AdRequest {
            test_devices: self.test_devices,
        }
    }
}
