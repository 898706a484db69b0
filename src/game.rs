use crate::engine::loader::Resources;
use crate::engine::stage::{Point, Stage, Texture};
use crate::error::EngineError;
use crate::sprite::{GameObject, ObjectKind};

pub const WORLD_WIDTH: f64 = 800.0;
pub const WORLD_HEIGHT: f64 = 600.0;
/// fps
pub const UPDATE_RATE: u32 = 30;

/// Ship spawn point: horizontally centred, near the bottom edge.
const SHIP_START: Point = Point::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT - 60.0);

/// Gameplay state. Created once textures are loaded and the game view is
/// on screen; collisions, movement and game over are not simulated yet.
#[derive(Debug)]
pub struct World {
    ship: GameObject,
}

impl World {
    pub fn init(stage: &mut Stage, textures: &Resources<Texture>) -> Result<World, EngineError> {
        let mut ship = GameObject::new(ObjectKind::Ship, textures)?;
        ship.set_position(SHIP_START);
        ship.insert_into(stage);
        log::info!("world ready, ship at {:?}", ship.position());
        Ok(World { ship })
    }

    pub fn ship(&self) -> &GameObject {
        &self.ship
    }
}
