//! Channel layouts for the blend-shape block
//!
//! The blend-shape block carries bare floats; their meaning comes from the
//! channel layout configured on the tracker side.

use std::borrow::Cow;

/// Tracker default profile, 51 channels in wire order
pub const STUDIO_2014_CHANNELS: [&str; 51] = [
    "EyeBlink_L",
    "EyeBlink_R",
    "EyeSquint_L",
    "EyeSquint_R",
    "EyeDown_L",
    "EyeDown_R",
    "EyeIn_L",
    "EyeIn_R",
    "EyeOpen_L",
    "EyeOpen_R",
    "EyeOut_L",
    "EyeOut_R",
    "EyeUp_L",
    "EyeUp_R",
    "BrowsD_L",
    "BrowsD_R",
    "BrowsU_C",
    "BrowsU_L",
    "BrowsU_R",
    "JawOpen",
    "LipsTogether",
    "JawLeft",
    "JawRight",
    "JawFwd",
    "LipsUpperUp_L",
    "LipsUpperUp_R",
    "LipsLowerDown_L",
    "LipsLowerDown_R",
    "LipsUpperClose",
    "LipsLowerClose",
    "MouthSmile_L",
    "MouthSmile_R",
    "MouthDimple_L",
    "MouthDimple_R",
    "LipsStretch_L",
    "LipsStretch_R",
    "MouthFrown_L",
    "MouthFrown_R",
    "MouthPress_L",
    "MouthPress_R",
    "LipsPucker",
    "LipsFunnel",
    "MouthLeft",
    "MouthRight",
    "ChinLowerRaise",
    "ChinUpperRaise",
    "Sneer_L",
    "Sneer_R",
    "Puff",
    "CheekSquint_L",
    "CheekSquint_R",
];

/// Rig-tuned profile: drops the eye in/out, LipsTogether, JawFwd and split
/// sneer channels, adds BrowsSqueeze, JawChew and a single Sneer.
pub const STUDIO_2014_CUSTOM_CHANNELS: [&str; 46] = [
    "EyeBlink_L",
    "EyeBlink_R",
    "EyeSquint_L",
    "EyeSquint_R",
    "EyeDown_L",
    "EyeDown_R",
    "EyeOpen_L",
    "EyeOpen_R",
    "EyeUp_L",
    "EyeUp_R",
    "BrowsD_L",
    "BrowsD_R",
    "BrowsU_C",
    "BrowsU_L",
    "BrowsU_R",
    "BrowsSqueeze",
    "JawOpen",
    "JawChew",
    "JawLeft",
    "JawRight",
    "LipsUpperUp_L",
    "LipsUpperUp_R",
    "LipsLowerDown_L",
    "LipsLowerDown_R",
    "LipsUpperClose",
    "LipsLowerClose",
    "MouthSmile_L",
    "MouthSmile_R",
    "MouthDimple_L",
    "MouthDimple_R",
    "LipsStretch_L",
    "LipsStretch_R",
    "MouthFrown_L",
    "MouthFrown_R",
    "MouthPress_L",
    "MouthPress_R",
    "LipsPucker",
    "LipsFunnel",
    "MouthLeft",
    "MouthRight",
    "ChinLowerRaise",
    "ChinUpperRaise",
    "Sneer",
    "Puff",
    "CheekSquint_L",
    "CheekSquint_R",
];

/// Which channel names the blend-shape floats carry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    #[default]
    Studio2014,
    Studio2014Custom,
}

impl ChannelLayout {
    pub fn names(self) -> &'static [&'static str] {
        match self {
            ChannelLayout::Studio2014 => &STUDIO_2014_CHANNELS,
            ChannelLayout::Studio2014Custom => &STUDIO_2014_CUSTOM_CHANNELS,
        }
    }

    pub fn len(self) -> usize {
        self.names().len()
    }

    pub fn is_empty(self) -> bool {
        self.names().is_empty()
    }

    /// Name of the channel at `index`; indices past the layout get a
    /// positional name so their values are never lost.
    pub fn name(self, index: usize) -> Cow<'static, str> {
        match self.names().get(index) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("Channel{}", index)),
        }
    }

    pub fn index_of(self, name: &str) -> Option<usize> {
        self.names().iter().position(|n| *n == name)
    }

    /// Configuration key
    pub fn key(self) -> &'static str {
        match self {
            ChannelLayout::Studio2014 => "studio-2014",
            ChannelLayout::Studio2014Custom => "studio-2014-custom",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "studio-2014" => Some(ChannelLayout::Studio2014),
            "studio-2014-custom" => Some(ChannelLayout::Studio2014Custom),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(ChannelLayout::Studio2014.len(), 51);
        assert_eq!(ChannelLayout::Studio2014Custom.len(), 46);
        assert_eq!(ChannelLayout::Studio2014.index_of("JawOpen"), Some(19));
        assert_eq!(ChannelLayout::Studio2014Custom.index_of("JawOpen"), Some(16));
    }

    #[test]
    fn test_overflow_names() {
        let layout = ChannelLayout::Studio2014Custom;
        assert_eq!(layout.name(0), "EyeBlink_L");
        assert_eq!(layout.name(46), "Channel46");
    }

    #[test]
    fn test_layout_keys() {
        for layout in [ChannelLayout::Studio2014, ChannelLayout::Studio2014Custom] {
            assert_eq!(ChannelLayout::from_key(layout.key()), Some(layout));
        }
        assert_eq!(ChannelLayout::from_key("nope"), None);
    }
}
