use super::color::Color;

/// Point in camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point2>,
    pub color: Color,
    /// Stroke width as a fraction of the viewport width.
    pub line_width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    /// Top-left corner of the label box.
    pub anchor: Point2,
    pub color: Color,
    pub background: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Point2>,
    pub color: Color,
    /// Dot radius in viewport pixels.
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    Line(Polyline),
    Label(Label),
    Points(PointCloud),
}

/// Geometry one draw call adds to the scene.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    nodes: Vec<SceneNode>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Polyline> {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::Line(l) => Some(l),
            _ => None,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::Label(l) => Some(l),
            _ => None,
        })
    }

    pub fn point_clouds(&self) -> impl Iterator<Item = &PointCloud> {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::Points(p) => Some(p),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_filters_by_kind() {
        let mut group = Group::new();
        group.add(SceneNode::Line(Polyline {
            points: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)],
            color: Color::OBJECT,
            line_width: 0.008,
        }));
        group.add(SceneNode::Label(Label {
            text: "cup 0.75".into(),
            anchor: Point2::new(0.0, 0.0),
            color: Color::LABEL_TEXT,
            background: Color::OBJECT,
        }));

        assert_eq!(group.len(), 2);
        assert_eq!(group.lines().count(), 1);
        assert_eq!(group.labels().count(), 1);
        assert_eq!(group.point_clouds().count(), 0);
    }

    #[test]
    fn test_empty_group() {
        assert!(Group::new().is_empty());
    }
}
