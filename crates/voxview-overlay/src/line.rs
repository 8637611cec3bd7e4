/// The raster points of a line segment, endpoints included (Bresenham).
pub fn line_points(x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<(i32, i32)> {
    let dx = (x2 - x1).abs();
    let dy = (y2 - y1).abs();
    let step_x = if x2 >= x1 { 1 } else { -1 };
    let step_y = if y2 >= y1 { 1 } else { -1 };
    let mut points = Vec::with_capacity((dx.max(dy) + 1) as usize);

    let mut x = x1;
    let mut y = y1;
    let mut err = dx - dy;
    loop {
        points.push((x, y));
        if x == x2 && y == y2 {
            break;
        }
        let doubled = 2 * err;
        if doubled > -dy {
            err -= dy;
            x += step_x;
        }
        if doubled < dx {
            err += dx;
            y += step_y;
        }
    }
    points
}
