use eframe::emath::{Pos2, Vec2};
use eframe::epaint::{CircleShape, FontFamily, FontId, Shape, Stroke, TextShape};
use egui::Color32;
use egui_graphs::{DisplayNode, DrawContext, NodeProps};
use petgraph::stable_graph::IndexType;
use petgraph::EdgeType;

pub(crate) trait NodeInfo {
    fn get_id(&self) -> &str;
    fn get_role(&self) -> NodeRole;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeRole {
    Source,
    Sink,
    OnPath,
    Other,
}

#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    id: String,
    role: NodeRole,
}

impl NodeData {
    pub(crate) fn new(id: &str, role: NodeRole) -> Self {
        Self {
            id: id.to_owned(),
            role,
        }
    }
}

impl NodeInfo for NodeData {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_role(&self) -> NodeRole {
        self.role
    }
}

struct RoleColor;

impl RoleColor {
    const SOURCE: Color32 = Color32::from_rgb(0x80, 0x80, 0xFF);
    const SOURCE_INTERACTED: Color32 = Color32::from_rgb(0xB0, 0xB0, 0xFF);
    const SINK: Color32 = Color32::from_rgb(0xFF, 0x80, 0x80);
    const SINK_INTERACTED: Color32 = Color32::from_rgb(0xFF, 0xB0, 0xB0);
    const ON_PATH: Color32 = Color32::from_rgb(0xFF, 0xA5, 0x00);
    const ON_PATH_INTERACTED: Color32 = Color32::from_rgb(0xFF, 0xC8, 0x60);

    fn get(role: NodeRole, is_interacted: bool) -> Option<Color32> {
        match (role, is_interacted) {
            (NodeRole::Source, false) => Some(Self::SOURCE),
            (NodeRole::Source, true) => Some(Self::SOURCE_INTERACTED),
            (NodeRole::Sink, false) => Some(Self::SINK),
            (NodeRole::Sink, true) => Some(Self::SINK_INTERACTED),
            (NodeRole::OnPath, false) => Some(Self::ON_PATH),
            (NodeRole::OnPath, true) => Some(Self::ON_PATH_INTERACTED),
            (NodeRole::Other, _) => None,
        }
    }
}

#[derive(Clone)]
pub(crate) struct CustomNodeShape {
    pos: Pos2,
    label_text: String,
    selected: bool,
    dragged: bool,

    radius: f32,
    role: NodeRole,
}

impl<N: Clone + NodeInfo> From<NodeProps<N>> for CustomNodeShape {
    fn from(node_props: NodeProps<N>) -> Self {
        Self {
            pos: node_props.location,
            label_text: node_props.payload.get_id().to_owned(),
            selected: node_props.selected,
            dragged: node_props.dragged,
            radius: 10.0,
            role: node_props.payload.get_role(),
        }
    }
}

impl<N: Clone + NodeInfo, E: Clone, Ty: EdgeType, Ix: IndexType> DisplayNode<N, E, Ty, Ix>
    for CustomNodeShape
{
    fn closest_boundary_point(&self, dir: Vec2) -> Pos2 {
        closest_point_on_circle(self.pos, self.radius, dir)
    }

    fn shapes(&mut self, ctx: &DrawContext) -> Vec<Shape> {
        let mut res = Vec::with_capacity(2);

        let is_interacted = self.selected || self.dragged;

        let color = RoleColor::get(self.role, is_interacted).unwrap_or_else(|| {
            let style = match is_interacted {
                true => ctx.ctx.style().visuals.widgets.active,
                false => ctx.ctx.style().visuals.widgets.inactive,
            };
            style.fg_stroke.color
        });

        let circle_center = ctx.meta.canvas_to_screen_pos(self.pos);
        let circle_radius = ctx.meta.canvas_to_screen_size(self.radius);
        let circle_shape = CircleShape {
            center: circle_center,
            radius: circle_radius,
            fill: color,
            stroke: Stroke::default(),
        };
        res.push(circle_shape.into());

        let black = Color32::BLACK;

        let galley = ctx.ctx.fonts(|f| {
            f.layout_no_wrap(
                self.label_text.clone(),
                FontId::new(circle_radius, FontFamily::Monospace),
                black,
            )
        });

        // id in the middle of the circle
        let label_pos = Pos2::new(
            circle_center.x - galley.size().x / 2.,
            circle_center.y - galley.size().y / 2.,
        );

        let label_shape = TextShape::new(label_pos, galley, black);
        res.push(label_shape.into());

        res
    }

    fn update(&mut self, state: &NodeProps<N>) {
        self.pos = state.location;
        self.label_text = state.payload.get_id().to_owned();
        self.selected = state.selected;
        self.dragged = state.dragged;
        self.role = state.payload.get_role();
    }

    fn is_inside(&self, pos: Pos2) -> bool {
        is_inside_circle(self.pos, self.radius, pos)
    }
}

fn closest_point_on_circle(center: Pos2, radius: f32, dir: Vec2) -> Pos2 {
    center + dir.normalized() * radius
}

fn is_inside_circle(center: Pos2, radius: f32, pos: Pos2) -> bool {
    let dir = pos - center;
    dir.length() <= radius
}
