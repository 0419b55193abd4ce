use crate::errors::RenderError;

/// Rasterize SVG source to PNG bytes at a fixed output size.
///
/// Local and synchronous; malformed markup fails here and is terminal for
/// the run. The tree is scaled so the card fills the full target canvas
/// whatever size the markup declares.
pub fn render_svg(source: &str, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(source, &opt)
        .map_err(|e| RenderError::InvalidSvg(e.to_string()))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or(RenderError::Allocation(width, height))?;

    let size = tree.size();
    let transform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}

#[cfg(test)]
pub(crate) fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    // IHDR is always the first chunk: signature (8) + length/type (8),
    // then width and height as big-endian u32s.
    if bytes.len() < 24 || &bytes[..8] != b"\x89PNG\r\n\x1a\n" {
        return None;
    }
    let w = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let h = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((w, h))
}
