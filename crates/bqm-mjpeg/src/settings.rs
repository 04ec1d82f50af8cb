//! Stream configuration: the overlay toggle flags, output sizing, and
//! per-server limits.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which on-screen-display fields get drawn onto each generated frame, plus
/// the font spec the caption bar would use if the crate rendered real text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OsdConfig {
    pub print_title: bool,
    pub print_tags: bool,
    pub print_cap_if_no_title: bool,
    pub print_comment: bool,
    pub print_make_model: bool,
    pub print_lens_model: bool,
    pub print_expo_sensitivity: bool,
    pub print_aperture_focal: bool,
    pub print_name: bool,
    pub print_date: bool,
    pub print_rating: bool,
    pub caption_font: String,
}

impl OsdConfig {
    pub fn any_enabled(&self) -> bool {
        self.print_title
            || self.print_tags
            || self.print_cap_if_no_title
            || self.print_comment
            || self.print_make_model
            || self.print_lens_model
            || self.print_expo_sensitivity
            || self.print_aperture_focal
            || self.print_name
            || self.print_date
            || self.print_rating
    }
}

/// Slideshow transition between consecutive album images. The full visual
/// repertoire is out of scope (Non-goal); these two are enough to exercise
/// the frame generator's transition dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionType {
    #[default]
    None,
    CrossFade,
}

/// A per-frame visual effect applied while an image is held on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EffectType {
    #[default]
    None,
    KenBurnsZoom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MjpegStreamSettings {
    pub port: u16,
    pub loop_album: bool,
    pub quality: u8,
    pub input_images: Vec<PathBuf>,
    pub out_width: u32,
    pub out_height: u32,
    /// Frames generated per second; the server's inter-frame delay is
    /// derived from this as `delay = 1_000_000 / rate` microseconds.
    pub rate: u32,
    /// Seconds each image is held on screen before the generator advances
    /// to the next one.
    pub delay_seconds: u32,
    /// Seconds spent cross-fading into an image before it's held, ignored
    /// when `transition` is `None`.
    pub transition_seconds: u32,
    pub max_clients: usize,
    pub transition: TransitionType,
    pub effect: EffectType,
    pub osd: OsdConfig,
    pub black_list: Vec<String>,
}

impl Default for MjpegStreamSettings {
    fn default() -> Self {
        MjpegStreamSettings {
            port: 8080,
            loop_album: true,
            quality: 75,
            input_images: Vec::new(),
            out_width: 1280,
            out_height: 720,
            rate: 15,
            delay_seconds: 5,
            transition_seconds: 1,
            max_clients: 10,
            transition: TransitionType::default(),
            effect: EffectType::default(),
            osd: OsdConfig::default(),
            black_list: Vec::new(),
        }
    }
}

impl MjpegStreamSettings {
    pub fn frame_delay(&self) -> std::time::Duration {
        let rate = self.rate.max(1);
        std::time::Duration::from_micros(1_000_000 / rate as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_delay_derives_from_rate() {
        let settings = MjpegStreamSettings::default();
        assert_eq!(settings.rate, 15);
        assert_eq!(settings.frame_delay(), std::time::Duration::from_micros(1_000_000 / 15));
    }

    #[test]
    fn osd_any_enabled_false_when_all_flags_unset() {
        assert!(!OsdConfig::default().any_enabled());
    }
}
