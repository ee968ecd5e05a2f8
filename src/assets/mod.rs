//! Image assets shared by blueprints.

/// Image decoding into premultiplied RGBA8.
pub mod decode;
/// Id-addressed store of decoded images.
pub mod store;
