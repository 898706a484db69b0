use crate::engine::stage::{Node, NodeId, Point, Size, Stage, Text};
use crate::engine::view::{View, ViewCore, ViewRegistry};
use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;

pub const MESSAGE_VIEW: &str = "message";

const FONT: &str = "12px monospace";
const FILL: &str = "gray";

/// A single line of text in the middle of the screen. Used while textures
/// load and for anything the player has to be told.
pub struct MessageView {
    core: ViewCore,
    text: NodeId,
}

impl MessageView {
    pub fn new(size: Size) -> Self {
        let mut stage = Stage::new("black");
        let text = stage.add(Node::Text(Text {
            content: "Hello world!".to_string(),
            font: FONT.to_string(),
            fill: FILL.to_string(),
            position: Point::new(size.width / 2.0, size.height / 2.0),
        }));
        MessageView {
            core: ViewCore::new(stage),
            text,
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        if let Some(Node::Text(text)) = self.core.stage_mut().get_mut(self.text) {
            text.content = message.into();
        }
    }

    pub fn message(&self) -> &str {
        self.core
            .stage()
            .nodes()
            .find_map(|node| match node {
                Node::Text(text) => Some(text.content.as_str()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl View for MessageView {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }
}

/// Puts `message` on the message view and switches to it.
pub fn show_message(
    views: &RefCell<ViewRegistry>,
    view: &Rc<RefCell<MessageView>>,
    message: impl Into<String>,
) -> Result<()> {
    view.borrow_mut().set_message(message);
    views.borrow_mut().switch_to(MESSAGE_VIEW)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_paused_with_greeting_centred() {
        let view = MessageView::new(Size::new(800.0, 600.0));
        assert!(view.is_paused());
        assert_eq!(view.message(), "Hello world!");
        let position = view.stage().nodes().find_map(|node| match node {
            Node::Text(text) => Some(text.position),
            _ => None,
        });
        assert_eq!(position, Some(Point::new(400.0, 300.0)));
    }

    #[test]
    fn set_message_replaces_the_text() {
        let mut view = MessageView::new(Size::new(800.0, 600.0));
        view.set_message("Loading textures: ship");
        assert_eq!(view.message(), "Loading textures: ship");
        assert_eq!(view.stage().len(), 1);
    }

    #[test]
    fn show_message_switches_to_the_message_view() {
        let views = RefCell::new(ViewRegistry::new());
        let view = Rc::new(RefCell::new(MessageView::new(Size::new(800.0, 600.0))));
        views.borrow_mut().register(MESSAGE_VIEW, view.clone());

        show_message(&views, &view, "Game over").expect("message view registered");

        assert_eq!(views.borrow().current_name(), Some(MESSAGE_VIEW));
        assert!(!view.borrow().is_paused());
        assert_eq!(view.borrow().message(), "Game over");
    }

    #[test]
    fn show_message_without_registration_fails() {
        let views = RefCell::new(ViewRegistry::new());
        let view = Rc::new(RefCell::new(MessageView::new(Size::new(800.0, 600.0))));
        assert!(show_message(&views, &view, "lost").is_err());
    }
}
