// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resource streams.
//!
//! Fetching is the browser's job
//! ([`Browser::get_resource`](crate::browser::Browser::get_resource)). A fetch
//! yields a pull-style [`ResourceStream`]; nodes that decode incrementally
//! (textures) implement the push-style [`StreamListener`]. [`pump`] moves
//! bytes from one to the other.

use alloc::string::String;
use alloc::vec::Vec;

/// A readable resource.
pub trait ResourceStream {
    /// Resolved URL.
    fn url(&self) -> &str;

    /// Media type, e.g. `"image/png"`.
    fn media_type(&self) -> &str;

    /// Reads up to `buf.len()` bytes. Returns 0 at end of stream.
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

/// Consumes resource bytes as they arrive.
pub trait StreamListener {
    /// The stream opened.
    fn stream_available(&mut self, url: &str, media_type: &str);

    /// A chunk of bytes arrived. An empty chunk marks end of stream.
    fn data_available(&mut self, data: &[u8]);
}

/// Feeds `stream` into `listener` in chunks of at most `chunk_size` bytes,
/// finishing with an empty chunk. Returns the number of bytes delivered.
pub fn pump(stream: &mut dyn ResourceStream, listener: &mut dyn StreamListener, chunk_size: usize) -> usize {
    listener.stream_available(stream.url(), stream.media_type());
    let mut buf = alloc::vec![0_u8; chunk_size.max(1)];
    let mut total = 0;
    loop {
        let n = stream.read(&mut buf);
        if n == 0 {
            break;
        }
        total += n;
        listener.data_available(&buf[..n]);
    }
    listener.data_available(&[]);
    total
}

/// An in-memory [`ResourceStream`].
#[derive(Clone, Debug)]
pub struct MemoryStream {
    url: String,
    media_type: String,
    data: Vec<u8>,
    pos: usize,
}

impl MemoryStream {
    /// Creates a stream over `data`.
    #[must_use]
    pub fn new(url: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            media_type: media_type.into(),
            data,
            pos: 0,
        }
    }
}

impl ResourceStream for MemoryStream {
    fn url(&self) -> &str {
        &self.url
    }

    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let rest = &self.data[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        n
    }
}
