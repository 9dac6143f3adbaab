use eframe::emath::{Pos2, Vec2};
use eframe::epaint::{FontFamily, FontId, Shape, TextShape};
use egui::{Color32, Stroke};
use egui_graphs::{DisplayEdge, DisplayNode, DrawContext, EdgeProps, Metadata, Node};
use petgraph::stable_graph::IndexType;
use petgraph::EdgeType;

// Based on DefaultEdgeShape

pub(crate) trait EdgeInfo {
    fn get_label(&self) -> &str;
    fn get_highlight(&self) -> EdgeHighlight;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EdgeHighlight {
    None,
    Path,
    Cut,
}

#[derive(Clone, Debug)]
pub(crate) struct EdgeData {
    label: String,
    highlight: EdgeHighlight,
}

impl EdgeData {
    pub(crate) fn new(label: String, highlight: EdgeHighlight) -> Self {
        Self { label, highlight }
    }
}

impl EdgeInfo for EdgeData {
    fn get_label(&self) -> &str {
        &self.label
    }

    fn get_highlight(&self) -> EdgeHighlight {
        self.highlight
    }
}

const PATH: Color32 = Color32::from_rgb(0xFF, 0xA5, 0x00);
const CUT: Color32 = Color32::from_rgb(0xFF, 0x40, 0x40);

/// Gap between the two edges of an opposite pair.
const ORDER_OFFSET: f32 = 6.;

#[derive(Clone)]
pub(crate) struct CustomEdgeShape {
    order: usize,
    selected: bool,
    label_text: String,

    width: f32,
    tip_size: f32,
    tip_angle: f32,
    highlight: EdgeHighlight,
}

impl<E: Clone + EdgeInfo> From<EdgeProps<E>> for CustomEdgeShape {
    fn from(edge_props: EdgeProps<E>) -> Self {
        Self {
            order: edge_props.order,
            selected: edge_props.selected,
            label_text: edge_props.payload.get_label().to_owned(),

            width: 2.,
            tip_size: 12.5,
            tip_angle: std::f32::consts::TAU / 30.,
            highlight: edge_props.payload.get_highlight(),
        }
    }
}

impl CustomEdgeShape {
    fn get_tip_points(&self, is_directed: bool, start: Pos2, end: Pos2, line_points: &mut [Pos2]) -> Vec<Pos2> {
        if !is_directed {
            return vec![];
        }

        let tip_dir = (end - start).normalized();
        let tip_angle = self.tip_angle;
        let tip_size = self.tip_size;

        let arrow_tip_dir_1 = rotate_vector(tip_dir, tip_angle) * tip_size;
        let arrow_tip_dir_2 = rotate_vector(tip_dir, -tip_angle) * tip_size;

        let tip_start_1 = end - arrow_tip_dir_1;
        let tip_start_2 = end - arrow_tip_dir_2;

        // replace end of an edge with start of tip
        line_points[1] = end - tip_size * tip_dir;

        vec![end, tip_start_1, tip_start_2]
    }

    fn width(&self) -> f32 {
        match self.highlight {
            EdgeHighlight::None => self.width,
            EdgeHighlight::Path | EdgeHighlight::Cut => self.width * 1.5,
        }
    }

    fn scale_stroke(metadata: &Metadata, stroke: &mut Stroke) {
        stroke.width = metadata.canvas_to_screen_size(stroke.width);
    }

    fn scale_points(metadata: &Metadata, points: &mut [Pos2]) {
        for point in points.iter_mut() {
            *point = metadata.canvas_to_screen_pos(*point);
        }
    }
}

impl<N: Clone, E: Clone + EdgeInfo, Ty: EdgeType, Ix: IndexType, D: DisplayNode<N, E, Ty, Ix>>
DisplayEdge<N, E, Ty, Ix, D> for CustomEdgeShape {
    fn shapes(&mut self, start_node: &Node<N, E, Ty, Ix, D>, end_node: &Node<N, E, Ty, Ix, D>, ctx: &DrawContext) -> Vec<Shape> {
        let mut res = vec![];

        let color = match self.highlight {
            EdgeHighlight::Path => PATH,
            EdgeHighlight::Cut => CUT,
            EdgeHighlight::None => {
                let style = match self.selected {
                    true => ctx.ctx.style().visuals.widgets.active,
                    false => ctx.ctx.style().visuals.widgets.inactive,
                };
                style.fg_stroke.color
            }
        };

        let mut stroke = Stroke::new(self.width(), color);

        let dir = (end_node.location() - start_node.location()).normalized();
        // opposite edges between the same nodes are drawn side by side
        let shift = dir.rot90() * ORDER_OFFSET * self.order as f32;
        let start = start_node.display().closest_boundary_point(dir) + shift;
        let end = end_node.display().closest_boundary_point(-dir) + shift;

        let mut line_points = vec![start, end];
        let mut tip_points = self.get_tip_points(ctx.is_directed, start, end, &mut line_points);
        let mut label_point = [start + (end - start) / 2. + dir.rot90() * ORDER_OFFSET];

        Self::scale_stroke(ctx.meta, &mut stroke);
        Self::scale_points(ctx.meta, &mut line_points);
        Self::scale_points(ctx.meta, &mut tip_points);
        Self::scale_points(ctx.meta, &mut label_point);

        res.push(Shape::line_segment(
            [line_points[0], line_points[1]],
            stroke,
        ));

        if ctx.is_directed {
            res.push(Shape::convex_polygon(
                tip_points,
                stroke.color,
                Stroke::default(),
            ));
        }

        if !self.label_text.is_empty() {
            let font_size = ctx.meta.canvas_to_screen_size(8.);
            let galley = ctx.ctx.fonts(|f| {
                f.layout_no_wrap(
                    self.label_text.clone(),
                    FontId::new(font_size, FontFamily::Monospace),
                    color,
                )
            });
            let label_pos = Pos2::new(
                label_point[0].x - galley.size().x / 2.,
                label_point[0].y - galley.size().y / 2.,
            );
            res.push(TextShape::new(label_pos, galley, color).into());
        }

        res
    }

    fn update(&mut self, state: &EdgeProps<E>) {
        self.order = state.order;
        self.selected = state.selected;
        self.label_text = state.payload.get_label().to_owned();
        self.highlight = state.payload.get_highlight();
    }

    fn is_inside(&self, start: &Node<N, E, Ty, Ix, D>, end: &Node<N, E, Ty, Ix, D>, pos: Pos2) -> bool {
        let pos_start = start.location();
        let pos_end = end.location();

        let distance = distance_segment_to_point(pos_start, pos_end, pos);
        distance <= self.width
    }
}

fn distance_segment_to_point(a: Pos2, b: Pos2, point: Pos2) -> f32 {
    let ab = b - a;
    let length = ab.dot(ab);
    if length == 0. {
        return (point - a).length();
    }
    let t = ((point - a).dot(ab) / length).clamp(0., 1.);
    (point - (a + ab * t)).length()
}

fn rotate_vector(vec: Vec2, angle: f32) -> Vec2 {
    let cos = angle.cos();
    let sin = angle.sin();
    Vec2::new(cos * vec.x - sin * vec.y, sin * vec.x + cos * vec.y)
}
