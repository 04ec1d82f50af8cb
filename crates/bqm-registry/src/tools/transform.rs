//! Geometry-only transform that keeps the chain's current container
//! format, in the style of a `Resize`/`Rotate` transform tool family.

use bqm_core::{ToolGroup, ToolSettings};

use crate::error::RegistryError;
use crate::tool_trait::{decode_input, reject_unknown_type, to_decoded_image, Tool, ToolContext, ToolOutcome, ToolOutput};

pub struct Resize;

impl Tool for Resize {
    fn name(&self) -> &str {
        "Resize"
    }

    fn group(&self) -> ToolGroup {
        ToolGroup::Transform
    }

    fn version(&self) -> u32 {
        1
    }

    fn default_settings(&self) -> ToolSettings {
        ToolSettings::new().with("width", 1920i64).with("height", 1080i64)
    }

    fn recognized_keys(&self) -> &'static [&'static str] {
        &["width", "height"]
    }

    fn output_suffix(&self, _settings: &ToolSettings) -> String {
        String::new()
    }

    fn supports_in_memory_input(&self) -> bool {
        true
    }

    fn apply(&self, ctx: &ToolContext, settings: &ToolSettings) -> Result<ToolOutcome, RegistryError> {
        let width = settings
            .get("width")
            .and_then(|v| v.as_int())
            .ok_or_else(|| reject_unknown_type("Resize", "width", "integer"))? as u32;
        let height = settings
            .get("height")
            .and_then(|v| v.as_int())
            .ok_or_else(|| reject_unknown_type("Resize", "height", "integer"))? as u32;

        let decoded = decode_input(ctx)?;
        let resized = decoded.resize(width, height, image::imageops::FilterType::Lanczos3);

        if ctx.is_last_in_chain {
            let suffix = ctx.input_path.extension().and_then(|e| e.to_str());
            let output_path = ctx.temp_output_path(suffix);
            resized.save(&output_path)?;
            Ok(ToolOutcome { output: ToolOutput::Path(output_path), no_metadata_write: false })
        } else {
            Ok(ToolOutcome { output: ToolOutput::Image(to_decoded_image(&resized)), no_metadata_write: false })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resizes_and_writes_to_disk_when_last_in_chain() {
        let dir = tempdir().unwrap();
        let input_path = dir.path().join("in.png");
        image::RgbImage::from_pixel(100, 80, image::Rgb([1, 2, 3])).save(&input_path).unwrap();

        let tool = Resize;
        let settings = ToolSettings::new().with("width", 50i64).with("height", 40i64);
        let ctx = ToolContext {
            input_path: input_path.clone(),
            working_dir: dir.path().to_path_buf(),
            io_file_settings: &bqm_core::IoFileSettings::default(),
            raw_loading_rule: bqm_core::RawLoadingRule::Demosaicing,
            exif_set_orientation: true,
            is_last_in_chain: true,
            input_image: None,
        };

        let outcome = tool.apply(&ctx, &settings).unwrap();
        let ToolOutput::Path(output_path) = outcome.output else {
            panic!("expected a disk path for the last step in a chain");
        };
        assert_eq!(output_path.extension().unwrap(), "png");

        let resized = image::open(&output_path).unwrap();
        assert_eq!(resized.width(), 50);
        assert_eq!(resized.height(), 40);
    }

    #[test]
    fn resizes_in_memory_when_not_last_in_chain() {
        let dir = tempdir().unwrap();
        let input_path = dir.path().join("in.png");
        image::RgbImage::from_pixel(100, 80, image::Rgb([1, 2, 3])).save(&input_path).unwrap();

        let tool = Resize;
        let settings = ToolSettings::new().with("width", 50i64).with("height", 40i64);
        let ctx = ToolContext {
            input_path: input_path.clone(),
            working_dir: dir.path().to_path_buf(),
            io_file_settings: &bqm_core::IoFileSettings::default(),
            raw_loading_rule: bqm_core::RawLoadingRule::Demosaicing,
            exif_set_orientation: true,
            is_last_in_chain: false,
            input_image: None,
        };

        let outcome = tool.apply(&ctx, &settings).unwrap();
        let ToolOutput::Image(image) = outcome.output else {
            panic!("expected an in-memory image for a non-final step");
        };
        assert_eq!((image.width, image.height), (50, 40));
    }

    #[test]
    fn resizes_an_in_memory_input_without_touching_the_input_path() {
        let dir = tempdir().unwrap();
        // A path that deliberately doesn't exist: the tool must read
        // `input_image` instead of opening this file.
        let input_path = dir.path().join("absent.png");
        let source = image::RgbImage::from_pixel(20, 20, image::Rgb([9, 8, 7]));

        let tool = Resize;
        let settings = ToolSettings::new().with("width", 10i64).with("height", 10i64);
        let ctx = ToolContext {
            input_path,
            working_dir: dir.path().to_path_buf(),
            io_file_settings: &bqm_core::IoFileSettings::default(),
            raw_loading_rule: bqm_core::RawLoadingRule::Demosaicing,
            exif_set_orientation: true,
            is_last_in_chain: false,
            input_image: Some(bqm_core::DecodedImage { width: 20, height: 20, rgb: source.into_raw() }),
        };

        let outcome = tool.apply(&ctx, &settings).unwrap();
        let ToolOutput::Image(image) = outcome.output else {
            panic!("expected an in-memory image for a non-final step");
        };
        assert_eq!((image.width, image.height), (10, 10));
    }

    #[test]
    fn missing_width_is_an_invalid_setting_error() {
        let dir = tempdir().unwrap();
        let input_path = dir.path().join("in.png");
        image::RgbImage::from_pixel(10, 10, image::Rgb([0, 0, 0])).save(&input_path).unwrap();

        let tool = Resize;
        let settings = ToolSettings::new().with("height", 40i64);
        let ctx = ToolContext {
            input_path,
            working_dir: dir.path().to_path_buf(),
            io_file_settings: &bqm_core::IoFileSettings::default(),
            raw_loading_rule: bqm_core::RawLoadingRule::Demosaicing,
            exif_set_orientation: true,
            is_last_in_chain: false,
            input_image: None,
        };

        assert!(tool.apply(&ctx, &settings).is_err());
    }
}
