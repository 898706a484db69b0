//! Sprite wrappers for the things that fly around the game view.
//!
//! A [`GameObject`] owns a sprite handle and remembers whether it is on a
//! stage. Inserting twice or removing twice does nothing.
pub mod objects;

pub use objects::{AsteroidType, BulletType, ObjectKind};

use crate::engine::loader::Resources;
use crate::engine::stage::{Node, NodeId, Point, Sprite, SpriteHandle, Stage, Texture};
use crate::error::EngineError;
use std::cell::RefCell;
use std::rc::Rc;

/// Parked off-screen until gameplay positions it.
const OFF_SCREEN: Point = Point::new(-100.0, -100.0);
const CENTRED: Point = Point::new(0.5, 0.5);

#[derive(Debug)]
pub struct GameObject {
    kind: ObjectKind,
    sprite: SpriteHandle,
    placed: Option<NodeId>,
}

impl GameObject {
    pub fn new(kind: ObjectKind, textures: &Resources<Texture>) -> Result<Self, EngineError> {
        let texture = textures.get(kind.texture_name())?.clone();
        let mut sprite = Sprite::new(texture);
        sprite.position = OFF_SCREEN;
        sprite.anchor = CENTRED;
        sprite.rotation = kind.initial_rotation();
        Ok(GameObject {
            kind,
            sprite: Rc::new(RefCell::new(sprite)),
            placed: None,
        })
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.sprite.borrow().position
    }

    pub fn set_position(&mut self, position: Point) {
        self.sprite.borrow_mut().position = position;
    }

    pub fn rotation(&self) -> f64 {
        self.sprite.borrow().rotation
    }

    pub fn set_rotation(&mut self, angle: f64) {
        self.sprite.borrow_mut().rotation = angle;
    }

    /// Scaled width in whole pixels.
    pub fn width(&self) -> f64 {
        let sprite = self.sprite.borrow();
        (sprite.texture.size().width * sprite.scale.x).floor()
    }

    /// Scaled height in whole pixels.
    pub fn height(&self) -> f64 {
        let sprite = self.sprite.borrow();
        (sprite.texture.size().height * sprite.scale.y).floor()
    }

    pub fn is_placed(&self) -> bool {
        self.placed.is_some()
    }

    pub fn insert_into(&mut self, stage: &mut Stage) {
        if self.placed.is_some() {
            return;
        }
        self.placed = Some(stage.add(Node::Sprite(Rc::clone(&self.sprite))));
    }

    pub fn remove_from(&mut self, stage: &mut Stage) {
        if let Some(id) = self.placed.take() {
            stage.remove(id);
        }
    }
}
