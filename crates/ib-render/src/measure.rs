//! Measurement-label layout for distance-measurement lines.
//!
//! Computes everything the overlay needs to draw a ruler readout: the
//! formatted distance, the label card's rectangle offset along the line's
//! terminal direction, and the dashed leader that connects the line's last
//! point to the card's *border* (a ray/rectangle intersection — the leader
//! must touch the card edge, not dive under its text).

use ib_core::geometry::{Bounds, Point, polyline_length};
use ib_core::model::{AuxData, Element};
use ib_core::units::{Calibration, MetricUnit, format_distance};

/// Distance from the line's last point to the label card center.
pub const LABEL_OFFSET: f32 = 50.0;

pub const LABEL_FONT_SIZE: f32 = 12.0;
pub const LABEL_HEIGHT: f32 = 16.0;
pub const LABEL_PADDING: f32 = 2.0;

/// A fully laid-out measurement readout, in scene coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementLabel {
    pub text: String,
    /// Opaque card the text is drawn into.
    pub card: Bounds,
    /// Leader from the line's last point…
    pub leader_start: Point,
    /// …to the intersection with the card border.
    pub leader_end: Point,
}

/// Rough text advance without a font context; real shaping lives with the
/// scene renderer.
pub fn approx_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.6
}

/// Lay out the measurement label for a ruler line, or `None` when the
/// element is not a measurement line or its length is degenerate.
pub fn measurement_label(
    element: &Element,
    calibration: &Calibration,
    unit: MetricUnit,
) -> Option<MeasurementLabel> {
    let Some(AuxData::Measurement { owner_image }) = element.aux else {
        return None;
    };
    let points = element.points_global();
    if points.len() < 2 {
        return None;
    }

    let scene_length = polyline_length(&points);
    if scene_length <= 0.0 {
        return None;
    }

    let cm = scene_length * calibration.ratio_for(owner_image);
    let text = format_distance(cm, unit);

    // Direction of the last non-degenerate segment.
    let last = points[points.len() - 1];
    let direction = points
        .windows(2)
        .rev()
        .map(|pair| pair[1] - pair[0])
        .find(|d| d.length() > 0.0)?
        .normalized();

    let center = last + Point::new(direction.x * LABEL_OFFSET, direction.y * LABEL_OFFSET);
    let width = approx_text_width(&text, LABEL_FONT_SIZE) + LABEL_PADDING * 2.0;
    let card = Bounds::new(
        center.x - width / 2.0,
        center.y - LABEL_HEIGHT / 2.0,
        width,
        LABEL_HEIGHT,
    );

    Some(MeasurementLabel {
        leader_end: card_border_intersection(card, last),
        text,
        card,
        leader_start: last,
    })
}

/// Point where the segment from the card center toward `from` crosses the
/// card's border.
fn card_border_intersection(card: Bounds, from: Point) -> Point {
    let center = card.center();
    let delta = from - center;
    let dir = delta.normalized();
    if dir == Point::ZERO {
        return center;
    }
    let half_w = card.width / 2.0;
    let half_h = card.height / 2.0;
    let tx = if dir.x.abs() > 0.0 { half_w / dir.x.abs() } else { f32::INFINITY };
    let ty = if dir.y.abs() > 0.0 { half_h / dir.y.abs() } else { f32::INFINITY };
    let t = tx.min(ty);
    Point::new(center.x + dir.x * t, center.y + dir.y * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ib_core::id::ElementId;
    use ib_core::model::{ElementKind, LinearBody};
    use ib_core::units::Calibration;
    use pretty_assertions::assert_eq;

    fn ruler(id: &str, points: Vec<Point>) -> Element {
        let mut body = LinearBody {
            points,
            routing: ib_core::model::Routing::Straight,
            start_binding: None,
            end_binding: None,
        };
        if body.points.is_empty() {
            body.points.push(Point::ZERO);
        }
        let mut el = Element::new(ElementId::intern(id), ElementKind::Line(body), 0.0, 0.0, 0.0, 0.0);
        el.aux = Some(AuxData::Measurement { owner_image: None });
        el
    }

    #[test]
    fn cumulative_distance_is_formatted_with_calibration() {
        // L-shaped ruler: 100 + 50 scene units, 0.1 cm per unit → 15 cm
        let el = ruler(
            "ruler_l",
            vec![Point::ZERO, Point::new(100.0, 0.0), Point::new(100.0, 50.0)],
        );
        let mut cal = Calibration::default();
        cal.calibrate(None, 0.1, 1.0);

        let label = measurement_label(&el, &cal, MetricUnit::Cm).unwrap();
        assert_eq!(label.text, "15 cm");
    }

    #[test]
    fn card_rides_the_terminal_direction() {
        let el = ruler("ruler_e", vec![Point::ZERO, Point::new(100.0, 0.0)]);
        let label = measurement_label(&el, &Calibration::default(), MetricUnit::Cm).unwrap();

        // Line heads due east: the card center is LABEL_OFFSET past the end
        let center = label.card.center();
        assert!((center.x - 150.0).abs() < 1e-3, "{center:?}");
        assert!(center.y.abs() < 1e-3);
    }

    #[test]
    fn leader_touches_card_border_not_center() {
        let el = ruler("ruler_b", vec![Point::ZERO, Point::new(100.0, 0.0)]);
        let label = measurement_label(&el, &Calibration::default(), MetricUnit::Cm).unwrap();

        let center = label.card.center();
        assert_eq!(label.leader_start, Point::new(100.0, 0.0));
        // The leader endpoint is on the card's left edge, not at its center
        assert!((label.leader_end.x - label.card.x).abs() < 1e-3);
        assert!(label.leader_end.x < center.x);
        assert!((label.leader_end.y - center.y).abs() < 1e-3);
    }

    #[test]
    fn degenerate_ruler_has_no_label() {
        let el = ruler("ruler_0", vec![Point::ZERO, Point::ZERO]);
        assert_eq!(
            measurement_label(&el, &Calibration::default(), MetricUnit::Cm),
            None
        );
    }

    #[test]
    fn non_measurement_line_has_no_label() {
        let mut el = ruler("plain", vec![Point::ZERO, Point::new(10.0, 0.0)]);
        el.aux = None;
        assert_eq!(
            measurement_label(&el, &Calibration::default(), MetricUnit::Cm),
            None
        );
    }
}
