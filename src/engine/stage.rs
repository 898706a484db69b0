//! Scene-graph root handed to the renderer.
//!
//! A [`Stage`] is an ordered list of nodes painted back to front. Views own
//! one each; the frame driver passes it to the render backend without
//! looking inside.
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::HtmlImageElement;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// A decoded image ready to be painted. Cloning shares the same element.
#[derive(Debug, Clone)]
pub struct Texture {
    image: HtmlImageElement,
}

impl Texture {
    pub fn new(image: HtmlImageElement) -> Self {
        Texture { image }
    }

    pub fn image(&self) -> &HtmlImageElement {
        &self.image
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.image.natural_width().into(),
            height: self.image.natural_height().into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sprite {
    pub texture: Texture,
    pub position: Point,
    /// (0.5, 0.5) centres the texture on `position`
    pub anchor: Point,
    /// radians
    pub rotation: f64,
    pub scale: Point,
    pub alpha: f64,
}

impl Sprite {
    pub fn new(texture: Texture) -> Self {
        Sprite {
            texture,
            position: Point::default(),
            anchor: Point::default(),
            rotation: 0.0,
            scale: Point::new(1.0, 1.0),
            alpha: 1.0,
        }
    }
}

/// Sprites are shared between their game object and the stage, so moving
/// the object moves what gets painted.
pub type SpriteHandle = Rc<RefCell<Sprite>>;

/// A texture repeated over an area, scrolled by `tile_offset`.
#[derive(Debug, Clone)]
pub struct TilingSprite {
    pub texture: Texture,
    pub size: Size,
    pub tile_offset: Point,
    pub alpha: f64,
}

impl TilingSprite {
    pub fn new(texture: Texture, size: Size) -> Self {
        TilingSprite {
            texture,
            size,
            tile_offset: Point::default(),
            alpha: 1.0,
        }
    }
}

/// Text centred on `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub content: String,
    pub font: String,
    pub fill: String,
    pub position: Point,
}

#[derive(Debug, Clone)]
pub enum Node {
    Sprite(SpriteHandle),
    Tiling(TilingSprite),
    Text(Text),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

#[derive(Debug)]
pub struct Stage {
    background: String,
    nodes: Vec<(NodeId, Node)>,
    next_id: u32,
    interactive: bool,
}

impl Stage {
    pub fn new(background: impl Into<String>) -> Self {
        Stage {
            background: background.into(),
            nodes: Vec::new(),
            next_id: 0,
            interactive: false,
        }
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    /// Appends `node` on top of everything already on the stage.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push((id, node));
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let index = self.nodes.iter().position(|(node_id, _)| *node_id == id)?;
        Some(self.nodes.remove(index).1)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|(node_id, _)| *node_id == id)
            .map(|(_, node)| node)
    }

    /// Nodes in paint order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(|(_, node)| node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the stage should react to pointer input. Views switch this
    /// off while paused and back on when resumed.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> Node {
        Node::Text(Text {
            content: content.into(),
            font: "12px monospace".into(),
            fill: "gray".into(),
            position: Point::new(400.0, 300.0),
        })
    }

    fn contents(stage: &Stage) -> Vec<String> {
        stage
            .nodes()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_stage_is_empty_and_not_interactive() {
        let stage = Stage::new("black");
        assert!(stage.is_empty());
        assert!(!stage.is_interactive());
        assert_eq!(stage.background(), "black");
    }

    #[test]
    fn nodes_paint_in_insertion_order() {
        let mut stage = Stage::new("black");
        stage.add(text("back"));
        stage.add(text("front"));
        assert_eq!(contents(&stage), vec!["back", "front"]);
    }

    #[test]
    fn remove_keeps_other_ids_valid() {
        let mut stage = Stage::new("black");
        let a = stage.add(text("a"));
        let b = stage.add(text("b"));
        let c = stage.add(text("c"));

        assert!(stage.remove(b).is_some());
        assert!(stage.remove(b).is_none());
        assert_eq!(contents(&stage), vec!["a", "c"]);

        if let Some(Node::Text(text)) = stage.get_mut(c) {
            text.content = "changed".into();
        }
        assert_eq!(contents(&stage), vec!["a", "changed"]);
        assert!(stage.get_mut(a).is_some());
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut stage = Stage::new("black");
        let first = stage.add(text("first"));
        stage.remove(first);
        let second = stage.add(text("second"));
        assert_ne!(first, second);
    }
}
