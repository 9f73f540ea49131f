//! Query resolution against a read-back picking buffer.

use std::collections::HashMap;

use super::{PickBuffer, PickTexel, PickingMode, PickingQuery, PickingResult};

/// Answer `query` from `buffer`.
///
/// Single-pixel modes read the texel under the query. Brush modes sample every
/// pixel within `brush_radius` of it, keep the object covering most samples and
/// report each of its distinct features once, weighted `1 - d / (r + 1)` by the
/// distance `d` of its closest sample. Only pixels inside the buffer are
/// visited; a non-finite radius covers the whole buffer.
pub fn resolve_query(buffer: &PickBuffer, query: &PickingQuery, brush_radius: f32) -> PickingResult {
    let cx = query.screen.x.floor() as i64;
    let cy = query.screen.y.floor() as i64;

    if query.mode.is_circle() {
        let radius = if brush_radius.is_finite() {
            brush_radius.max(0.0)
        } else {
            (buffer.width() as f32).hypot(buffer.height() as f32)
        };
        return resolve_circle(buffer, query.mode, cx, cy, radius);
    }

    let texel = buffer.texel(cx, cy);
    if texel.is_background() {
        return PickingResult::none(query.mode);
    }

    let mut result = PickingResult::none(query.mode);
    result.ro_idx = texel.ro;
    if query.mode == PickingMode::Ro {
        result.element_idx.push(-1);
        result.weights.push(1.0);
    } else {
        result.push(&texel, 1.0);
    }
    result
}

#[derive(Default)]
struct Coverage {
    pixels: usize,
    nearest: f32,
}

fn resolve_circle(buffer: &PickBuffer, mode: PickingMode, cx: i64, cy: i64, radius: f32) -> PickingResult {
    let reach = radius.floor() as i64;
    let x0 = cx.saturating_sub(reach).max(0);
    let x1 = cx.saturating_add(reach).min(buffer.width() as i64 - 1);
    let y0 = cy.saturating_sub(reach).max(0);
    let y1 = cy.saturating_add(reach).min(buffer.height() as i64 - 1);

    let samples: Vec<(PickTexel, f32)> = (y0..=y1)
        .flat_map(|y| (x0..=x1).map(move |x| (x, y)))
        .filter_map(|(x, y)| {
            let dx = x.saturating_sub(cx) as f32;
            let dy = y.saturating_sub(cy) as f32;
            let d = dx.hypot(dy);
            if d > radius {
                return None;
            }
            let texel = buffer.texel(x, y);
            (!texel.is_background()).then_some((texel, d))
        })
        .collect();

    let mut coverage: HashMap<i32, Coverage> = HashMap::new();
    for (texel, d) in &samples {
        let entry = coverage.entry(texel.ro).or_insert(Coverage {
            pixels: 0,
            nearest: f32::INFINITY,
        });
        entry.pixels += 1;
        entry.nearest = entry.nearest.min(*d);
    }

    // Most pixels, then nearest to the center, then lowest index
    let Some(winner) = coverage
        .iter()
        .min_by(|(ra, a), (rb, b)| {
            b.pixels
                .cmp(&a.pixels)
                .then(a.nearest.total_cmp(&b.nearest))
                .then(ra.cmp(rb))
        })
        .map(|(ro, _)| *ro)
    else {
        return PickingResult::none(mode);
    };

    let mut features: HashMap<PickTexel, f32> = HashMap::new();
    for (texel, d) in samples.iter().filter(|(t, _)| t.ro == winner) {
        let weight = 1.0 - d / (radius + 1.0);
        features
            .entry(*texel)
            .and_modify(|w| *w = w.max(weight))
            .or_insert(weight);
    }

    let mut features: Vec<(PickTexel, f32)> = features.into_iter().collect();
    features.sort_by(|(ta, wa), (tb, wb)| {
        wb.total_cmp(wa)
            .then((ta.vertex, ta.element, ta.edge).cmp(&(tb.vertex, tb.element, tb.edge)))
    });

    let mut result = PickingResult::none(mode);
    result.ro_idx = winner;
    for (texel, weight) in &features {
        result.push(texel, *weight);
    }
    result
}
