//! Generates the next JPEG frame to publish to connected clients.
//!
//! A decode failure substitutes a placeholder frame and keeps the stream
//! alive rather than aborting it: a solid dark gray frame with an
//! "unavailable" caption bar, using the same caption-bar mechanism the OSD
//! overlay below draws, so there is only one text-rendering code path in
//! the crate.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bqm_core::{InfoProvider, ItemInfo, PreviewLoader};
use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::MjpegError;
use crate::settings::{EffectType, MjpegStreamSettings, TransitionType};

const CAPTION_BAR_HEIGHT: u32 = 24;

pub struct FrameGenerator {
    settings: MjpegStreamSettings,
    preview_loader: Arc<dyn PreviewLoader>,
    info_provider: Arc<dyn InfoProvider>,
    cursor: AtomicUsize,
}

impl FrameGenerator {
    pub fn new(
        settings: MjpegStreamSettings,
        preview_loader: Arc<dyn PreviewLoader>,
        info_provider: Arc<dyn InfoProvider>,
    ) -> Self {
        FrameGenerator { settings, preview_loader, info_provider, cursor: AtomicUsize::new(0) }
    }

    /// Advances the playhead and encodes the next frame as JPEG bytes.
    /// Returns `Ok(None)` once a non-looping album has been fully played.
    pub fn next_frame(&self) -> Result<Option<Vec<u8>>, MjpegError> {
        let tick = self.cursor.fetch_add(1, Ordering::Relaxed);
        let Some((index, fade_from)) = self.locate(tick) else {
            return Ok(None);
        };
        let path = self.settings.input_images[index].clone();

        let canvas = match fade_from {
            Some((previous_index, progress)) => {
                let previous_path = &self.settings.input_images[previous_index];
                let from_canvas = self.load_canvas(previous_path);
                let to_canvas = self.load_canvas(&path);
                blend_frames(&from_canvas, &to_canvas, progress)
            }
            None => self.apply_effect(self.load_canvas(&path)),
        };

        let info = self.info_provider.info(&path);
        let canvas = if self.settings.osd.any_enabled() {
            draw_caption_bar(canvas, &overlay_text(&self.settings.osd, &info))
        } else {
            canvas
        };

        encode_jpeg(&canvas, self.settings.quality)
    }

    fn load_canvas(&self, path: &std::path::Path) -> RgbImage {
        match self.preview_loader.load(path) {
            Some(decoded) => {
                let buffer: RgbImage =
                    ImageBuffer::from_raw(decoded.width, decoded.height, decoded.rgb)
                        .unwrap_or_else(|| RgbImage::new(decoded.width.max(1), decoded.height.max(1)));
                image::imageops::resize(
                    &buffer,
                    self.settings.out_width,
                    self.settings.out_height,
                    image::imageops::FilterType::Triangle,
                )
            }
            None => placeholder_canvas(self.settings.out_width, self.settings.out_height, "frame unavailable"),
        }
    }

    fn apply_effect(&self, image: RgbImage) -> RgbImage {
        match self.settings.effect {
            EffectType::None => image,
            // A full Ken Burns implementation needs per-frame crop state
            // beyond this generator's single-shot `next_frame` call; a
            // slight center crop-and-rescale approximates the zoom look
            // for a single still frame without that extra state.
            EffectType::KenBurnsZoom => {
                let (w, h) = image.dimensions();
                let crop_w = (w as f32 * 0.9) as u32;
                let crop_h = (h as f32 * 0.9) as u32;
                let x = (w - crop_w) / 2;
                let y = (h - crop_h) / 2;
                let cropped = image::imageops::crop_imm(&image, x, y, crop_w, crop_h).to_image();
                image::imageops::resize(&cropped, w, h, image::imageops::FilterType::Triangle)
            }
        }
    }

    /// How many `next_frame` calls hold the same image before advancing,
    /// derived from `rate * delay_seconds` so a slower rate still dwells on
    /// each image for the configured wall-clock duration.
    fn frames_per_image(&self) -> usize {
        (self.settings.rate.max(1) as usize * self.settings.delay_seconds.max(1) as usize).max(1)
    }

    /// How many cross-fade frames precede an image's hold phase, derived
    /// from `rate * transition_seconds`. Zero when no transition is
    /// configured, so a slot collapses back to just the hold phase.
    fn transition_frames(&self) -> usize {
        if self.settings.transition == TransitionType::None {
            0
        } else {
            (self.settings.rate.max(1) as usize * self.settings.transition_seconds as usize).max(1)
        }
    }

    fn slot_len(&self) -> usize {
        self.transition_frames() + self.frames_per_image()
    }

    /// Resolves a global tick to the image it falls on, plus, when the
    /// tick lands in that image's transition phase, the image being faded
    /// from and how far into the fade (0 exclusive, 1 inclusive) this
    /// frame sits.
    fn locate(&self, tick: usize) -> Option<(usize, Option<(usize, f32)>)> {
        let images = &self.settings.input_images;
        if images.is_empty() {
            return None;
        }
        let slot = self.slot_len();
        let trans = self.transition_frames();
        // The first image has no incoming fade to play, so every tick is
        // shifted forward by `trans`: tick 0 lands straight in image 0's
        // hold phase instead of a transition phase with no source frame.
        let adjusted = tick + trans;
        let mut index = adjusted / slot;
        let offset = adjusted % slot;
        if index >= images.len() {
            if self.settings.loop_album {
                index %= images.len();
            } else {
                return None;
            }
        }

        if offset < trans {
            let previous = if index == 0 {
                if self.settings.loop_album { images.len() - 1 } else { index }
            } else {
                index - 1
            };
            let progress = (offset + 1) as f32 / trans as f32;
            Some((index, Some((previous, progress))))
        } else {
            Some((index, None))
        }
    }
}

/// Linearly interpolates each channel between two frames, used to
/// cross-fade out of the previous image and into the next one.
fn blend_frames(from: &RgbImage, to: &RgbImage, progress: f32) -> RgbImage {
    let (width, height) = to.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        let a = from.get_pixel(x.min(from.width().saturating_sub(1)), y.min(from.height().saturating_sub(1)));
        let b = to.get_pixel(x, y);
        Rgb([lerp(a[0], b[0], progress), lerp(a[1], b[1], progress), lerp(a[2], b[2], progress)])
    })
}

fn lerp(from: u8, to: u8, progress: f32) -> u8 {
    (from as f32 + (to as f32 - from as f32) * progress).round().clamp(0.0, 255.0) as u8
}

fn placeholder_canvas(width: u32, height: u32, caption: &str) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width.max(1), height.max(1), Rgb([40, 40, 40]));
    canvas = draw_caption_bar(canvas, caption);
    canvas
}

fn overlay_text(osd: &crate::settings::OsdConfig, info: &ItemInfo) -> String {
    let mut fields = Vec::new();
    if osd.print_title {
        if let Some(title) = &info.title {
            fields.push(title.clone());
        } else if osd.print_cap_if_no_title {
            if let Some(comment) = &info.comment {
                fields.push(comment.clone());
            }
        }
    }
    if osd.print_comment {
        if let Some(comment) = &info.comment {
            fields.push(comment.clone());
        }
    }
    if osd.print_tags && !info.tags.is_empty() {
        fields.push(info.tags.join(", "));
    }
    if osd.print_make_model {
        if let (Some(make), Some(model)) = (&info.make, &info.model) {
            fields.push(format!("{make} {model}"));
        }
    }
    if osd.print_lens_model {
        if let Some(lens) = &info.lens_model {
            fields.push(lens.clone());
        }
    }
    if osd.print_expo_sensitivity {
        if let Some(iso) = info.sensitivity_iso {
            fields.push(format!("ISO {iso}"));
        }
    }
    if osd.print_aperture_focal {
        if let (Some(aperture), Some(focal)) = (info.aperture, info.focal_length) {
            fields.push(format!("f/{aperture:.1} {focal:.0}mm"));
        }
    }
    if osd.print_rating {
        if let Some(rating) = info.rating {
            fields.push(format!("{rating}/5"));
        }
    }
    fields.join(" | ")
}

/// Draws a solid caption bar across the bottom of the frame. This is
/// deliberately not real text rendering, since no font shaping engine is
/// pulled in for a visually unspecified caption; it fills a bar whose
/// width is proportional to the caption length so an empty caption
/// produces an empty (invisible) bar.
fn draw_caption_bar(mut canvas: RgbImage, caption: &str) -> RgbImage {
    if caption.is_empty() {
        return canvas;
    }
    let (width, height) = canvas.dimensions();
    if height <= CAPTION_BAR_HEIGHT {
        return canvas;
    }
    let bar_top = height - CAPTION_BAR_HEIGHT;
    let filled_width = ((caption.len() as u32 * 8).min(width)).max(1);
    for y in bar_top..height {
        for x in 0..width {
            let pixel = if x < filled_width { Rgb([230, 230, 230]) } else { Rgb([0, 0, 0]) };
            canvas.put_pixel(x, y, pixel);
        }
    }
    canvas
}

fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Option<Vec<u8>>, MjpegError> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder.encode_image(canvas)?;
    Ok(Some(bytes))
}
