use crate::db::core::Layout;
use crate::db::route::RouteResult;
use crate::geom::rect::Rect;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as ImageRect;
use std::path::Path;

const LAYER_COLORS: [Rgba<u8>; 6] = [
    Rgba([0, 110, 255, 200]),
    Rgba([255, 20, 80, 200]),
    Rgba([0, 255, 100, 200]),
    Rgba([255, 215, 0, 200]),
    Rgba([180, 50, 255, 200]),
    Rgba([0, 240, 255, 200]),
];

/// Renders cells, blockages, wires and vias of a routed layout to a PNG.
pub fn draw_routed_layout(
    layout: &Layout,
    result: &RouteResult,
    layers: &[String],
    filename: &str,
    width: u32,
    height: u32,
) -> Result<(), image::ImageError> {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));

    let Some(bounds) = drawing_bounds(layout, result) else {
        return img.save(Path::new(filename));
    };
    let bounds = bounds.inflate(bounds.width().max(bounds.height()) * 0.02 + 1.0);

    let scale = (width as f64 / bounds.width()).min(height as f64 / bounds.height());
    let map = |x: f64, y: f64| {
        (
            (x - bounds.min.x) * scale,
            height as f64 - (y - bounds.min.y) * scale,
        )
    };

    let cell_color = Rgba([70, 70, 80, 255]);
    for cell in &layout.cells {
        let r = cell.bounding_box();
        let (x, y_bot) = map(r.min.x, r.min.y);
        let w = (r.width() * scale).max(1.0);
        let h = (r.height() * scale).max(1.0);
        let rect = ImageRect::at(x as i32, (y_bot - h) as i32).of_size(w as u32, h as u32);
        draw_filled_rect_mut(&mut img, rect, cell_color);
    }

    let blockage_color = Rgba([160, 60, 40, 255]);
    for blockage in &layout.blockages {
        let r = blockage.rect;
        let (x, y_bot) = map(r.min.x, r.min.y);
        let w = (r.width() * scale).max(1.0);
        let h = (r.height() * scale).max(1.0);
        let rect = ImageRect::at(x as i32, (y_bot - h) as i32).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(&mut img, rect, blockage_color);
    }

    let layer_index = |name: &str| layers.iter().position(|l| l == name).unwrap_or(0);

    // Lower layers first so upper metal stays visible.
    let mut segments: Vec<(usize, (f64, f64), (f64, f64))> = Vec::new();
    for path in &result.routes {
        for pair in path.points.windows(2) {
            if pair[0].layer != pair[1].layer {
                continue;
            }
            segments.push((
                layer_index(&pair[0].layer),
                map(pair[0].x, pair[0].y),
                map(pair[1].x, pair[1].y),
            ));
        }
    }
    segments.sort_by_key(|s| s.0);

    for (layer, (x1, y1), (x2, y2)) in segments {
        let color = LAYER_COLORS[layer.min(LAYER_COLORS.len() - 1)];
        draw_line_segment_mut(&mut img, (x1 as f32, y1 as f32), (x2 as f32, y2 as f32), color);
        if layer >= 1 {
            draw_line_segment_mut(
                &mut img,
                ((x1 + 0.5) as f32, (y1 + 0.5) as f32),
                ((x2 + 0.5) as f32, (y2 + 0.5) as f32),
                color,
            );
        }
    }

    let via_color = Rgba([255, 255, 255, 230]);
    for via in result.routes.iter().flat_map(|p| p.vias.iter()) {
        let (vx, vy) = map(via.position.x, via.position.y);
        let side = ((via.diameter * scale).round() as u32).max(3);
        let half = (side / 2) as i32;
        let rect = ImageRect::at(vx as i32 - half, vy as i32 - half).of_size(side, side);
        draw_filled_rect_mut(&mut img, rect, via_color);
    }

    img.save(Path::new(filename))
}

fn drawing_bounds(layout: &Layout, result: &RouteResult) -> Option<Rect> {
    let route_bounds = result
        .routes
        .iter()
        .flat_map(|p| p.points.iter())
        .map(|p| Rect::new(p.position(), p.position()))
        .reduce(|a, b| a.union(&b));
    match (layout.extent(), route_bounds) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, b) => a.or(b),
    }
}
