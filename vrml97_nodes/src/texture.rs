// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `ImageTexture` and `PixelTexture`.
//!
//! On initialize, and whenever `url` changes afterwards, the first URL the
//! browser can resolve is streamed into an [`ImageLoader`]. Binary PNM
//! (`P5` grey, `P6` RGB) is decoded when the stream ends; other formats keep
//! their raw bytes and draw nothing. A load that goes wrong leaves a
//! [`LoadFailure`] on the buffer.

use std::sync::Arc;

use parking_lot::Mutex;
use vrml97_core::field::{FieldType, FieldValue};
use vrml97_core::node::capability::{Capabilities, TextureNode};
use vrml97_core::node::class::{ClassDecl, InterfaceDecl};
use vrml97_core::node::{NodeContext, NodeView};
use vrml97_core::resource::{StreamListener, pump};
use vrml97_core::viewer::{TextureImage, Viewer};

const CHUNK_SIZE: usize = 4096;

/// Why an image load produced nothing drawable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadFailure {
    /// None of the URLs resolved to a stream.
    Unresolved,
    /// The stream ended without delivering any bytes.
    Empty,
    /// The data has a PNM header but is truncated or malformed.
    Undecodable,
}

/// A decoded image, bottom row first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageBuffer {
    /// Resolved URL of the loaded stream.
    pub url: String,
    /// Media type reported by the stream.
    pub media_type: String,
    /// Width in pixels; 0 until decoded.
    pub width: u32,
    /// Height in pixels; 0 until decoded.
    pub height: u32,
    /// Bytes per pixel.
    pub components: u8,
    /// Decoded pixels, or the raw stream bytes while loading and for
    /// formats that are not decoded.
    pub pixels: Vec<u8>,
    /// The stream has ended.
    pub complete: bool,
    /// Set when the load failed.
    pub failure: Option<LoadFailure>,
}

impl ImageBuffer {
    /// Whether the buffer holds decoded pixels.
    #[inline]
    #[must_use]
    pub fn is_decoded(&self) -> bool {
        self.complete && self.width > 0 && self.height > 0
    }
}

/// Image state shared between a texture node and its loader.
pub type SharedImage = Arc<Mutex<ImageBuffer>>;

/// Accumulates a resource stream into a [`SharedImage`].
#[derive(Debug)]
pub struct ImageLoader {
    image: SharedImage,
}

impl ImageLoader {
    /// A loader writing into `image`.
    #[must_use]
    pub fn new(image: SharedImage) -> Self {
        Self { image }
    }
}

impl StreamListener for ImageLoader {
    fn stream_available(&mut self, url: &str, media_type: &str) {
        let mut image = self.image.lock();
        *image = ImageBuffer {
            url: url.into(),
            media_type: media_type.into(),
            ..ImageBuffer::default()
        };
    }

    fn data_available(&mut self, data: &[u8]) {
        let mut image = self.image.lock();
        if image.complete {
            return;
        }
        if !data.is_empty() {
            image.pixels.extend_from_slice(data);
            return;
        }
        image.complete = true;
        if let Some((width, height, components, pixels)) = decode_pnm(&image.pixels) {
            image.width = width;
            image.height = height;
            image.components = components;
            image.pixels = pixels;
        } else if is_pnm(&image.pixels) {
            image.failure = Some(LoadFailure::Undecodable);
        }
    }
}

/// Decodes a binary PNM (`P5` or `P6`, maxval up to 255) and flips it so the
/// bottom row comes first.
///
/// Returns `(width, height, components, pixels)`, or `None` if `data` is not
/// such an image or is truncated.
#[must_use]
pub fn decode_pnm(data: &[u8]) -> Option<(u32, u32, u8, Vec<u8>)> {
    let components: u8 = match data.get(..2)? {
        b"P5" => 1,
        b"P6" => 3,
        _ => return None,
    };
    let mut pos = 2;
    let width = header_number(data, &mut pos)?;
    let height = header_number(data, &mut pos)?;
    let maxval = header_number(data, &mut pos)?;
    if width == 0 || height == 0 || maxval == 0 || maxval > 255 {
        return None;
    }
    // Exactly one whitespace byte separates the header from the raster.
    if !data.get(pos)?.is_ascii_whitespace() {
        return None;
    }
    pos += 1;

    let row = usize::try_from(width).ok()? * usize::from(components);
    let len = row.checked_mul(usize::try_from(height).ok()?)?;
    let raster = data.get(pos..pos.checked_add(len)?)?;
    let mut pixels = Vec::with_capacity(len);
    for line in raster.chunks_exact(row).rev() {
        pixels.extend_from_slice(line);
    }
    Some((width, height, components, pixels))
}

fn is_pnm(data: &[u8]) -> bool {
    matches!(data.get(..2), Some(b"P5" | b"P6"))
}

/// Reads one decimal header field, skipping whitespace and `#` comments.
fn header_number(data: &[u8], pos: &mut usize) -> Option<u32> {
    loop {
        match data.get(*pos)? {
            b'#' => {
                while *data.get(*pos)? != b'\n' {
                    *pos += 1;
                }
            }
            c if c.is_ascii_whitespace() => *pos += 1,
            _ => break,
        }
    }
    let start = *pos;
    while data.get(*pos).is_some_and(u8::is_ascii_digit) {
        *pos += 1;
    }
    core::str::from_utf8(&data[start..*pos]).ok()?.parse().ok()
}

// -- ImageTexture --

static IMAGE_TEXTURE_INTERFACES: [InterfaceDecl; 3] = [
    InterfaceDecl::exposed_field(FieldType::MfString, "url").with_side_effect(url_changed),
    InterfaceDecl::field(FieldType::SfBool, "repeatS").with_default(|| FieldValue::SfBool(true)),
    InterfaceDecl::field(FieldType::SfBool, "repeatT").with_default(|| FieldValue::SfBool(true)),
];

/// `ImageTexture { url [] repeatS TRUE repeatT TRUE }`
pub static IMAGE_TEXTURE: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        texture: Some(TextureNode {
            apply: apply_image_texture,
        }),
        ..Capabilities::NONE
    },
    initialize: Some(load),
    ..ClassDecl::new(&IMAGE_TEXTURE_INTERFACES)
};

fn load(ctx: &mut NodeContext<'_>, _: f64) {
    let image = SharedImage::default();
    ctx.set_state(image.clone());
    let urls = ctx.view().strings("url").unwrap_or_default().to_vec();
    let mut loader = ImageLoader::new(image.clone());
    let delivered = urls
        .iter()
        .find_map(|url| ctx.browser().get_resource(url))
        .map(|mut stream| pump(stream.as_mut(), &mut loader, CHUNK_SIZE));
    let failure = match delivered {
        None if !urls.is_empty() => Some(LoadFailure::Unresolved),
        Some(0) => Some(LoadFailure::Empty),
        _ => None,
    };
    if failure.is_some() {
        image.lock().failure = failure;
    }
    ctx.set_modified(true);
}

fn url_changed(ctx: &mut NodeContext<'_>, _: &FieldValue, timestamp: f64) {
    // Before initialize there is nothing to reload.
    if ctx.state::<SharedImage>().is_some() {
        load(ctx, timestamp);
    }
}

fn apply_image_texture(view: &NodeView<'_>, viewer: &mut dyn Viewer) {
    let Some(image) = view.state::<SharedImage>() else {
        return;
    };
    let image = image.lock();
    if image.is_decoded() {
        insert(view, viewer, image.width, image.height, image.components, &image.pixels);
    }
}

/// Binds pixels with the node's `repeatS` and `repeatT`.
fn insert(view: &NodeView<'_>, viewer: &mut dyn Viewer, width: u32, height: u32, components: u8, pixels: &[u8]) {
    // The texture belongs to the enclosing shape's display object.
    _ = viewer.insert_texture(&TextureImage {
        width,
        height,
        components,
        pixels,
        repeat_s: view.bool("repeatS").unwrap_or(true),
        repeat_t: view.bool("repeatT").unwrap_or(true),
    });
}

// -- PixelTexture --

static PIXEL_TEXTURE_INTERFACES: [InterfaceDecl; 3] = [
    InterfaceDecl::exposed_field(FieldType::SfImage, "image"),
    InterfaceDecl::field(FieldType::SfBool, "repeatS").with_default(|| FieldValue::SfBool(true)),
    InterfaceDecl::field(FieldType::SfBool, "repeatT").with_default(|| FieldValue::SfBool(true)),
];

/// `PixelTexture { image 0 0 0 repeatS TRUE repeatT TRUE }`
///
/// An image whose dimensions disagree with its pixel data draws nothing.
pub static PIXEL_TEXTURE: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        texture: Some(TextureNode {
            apply: apply_pixel_texture,
        }),
        ..Capabilities::NONE
    },
    ..ClassDecl::new(&PIXEL_TEXTURE_INTERFACES)
};

fn apply_pixel_texture(view: &NodeView<'_>, viewer: &mut dyn Viewer) {
    if let Some(image) = view.image("image").filter(|i| i.is_drawable()) {
        insert(view, viewer, image.width, image.height, image.components, &image.pixels);
    }
}
