use ndext_frame::FrameConfig;

/// Controls how the registry encodes frames and treats unknown tags.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Frame codec settings used for every encode.
    pub frame: FrameConfig,
    /// When true, extension values with unregistered tags found inside
    /// documents return `RegistryError::UnknownTag` instead of being skipped.
    pub fail_on_unknown_tag: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            fail_on_unknown_tag: false,
        }
    }
}
