use crate::config::textures::STARS;
use crate::engine::loader::Resources;
use crate::engine::stage::{Node, NodeId, Point, Size, Stage, Texture, TilingSprite};
use crate::engine::view::{View, ViewCore};
use crate::error::EngineError;
use crate::game::World;

pub const GAME_VIEW: &str = "game";

/// Star field drift per frame.
const STAR_DRIFT: Point = Point::new(1.0, 1.0);

/// Gameplay screen: a drifting star field with the world on top.
pub struct GameView {
    core: ViewCore,
    stars: NodeId,
    world: Option<World>,
}

impl GameView {
    pub fn new(textures: &Resources<Texture>, size: Size) -> Result<Self, EngineError> {
        let stars = textures.get(STARS)?.clone();
        let mut stage = Stage::new("black");
        let stars = stage.add(Node::Tiling(TilingSprite::new(stars, size)));
        Ok(GameView {
            core: ViewCore::new(stage),
            stars,
            world: None,
        })
    }

    /// Hands the view to gameplay once textures are in.
    pub fn start_world(&mut self, textures: &Resources<Texture>) -> Result<(), EngineError> {
        let world = World::init(self.core.stage_mut(), textures)?;
        self.world = Some(world);
        Ok(())
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn opacity(&self) -> f64 {
        self.core
            .stage()
            .nodes()
            .find_map(|node| match node {
                Node::Tiling(stars) => Some(stars.alpha),
                _ => None,
            })
            .unwrap_or(1.0)
    }

    pub fn set_opacity(&mut self, alpha: f64) {
        if let Some(stars) = self.stars_mut() {
            stars.alpha = alpha;
        }
    }

    pub fn move_stars(&mut self, by: Point) {
        if let Some(stars) = self.stars_mut() {
            stars.tile_offset.x += by.x;
            stars.tile_offset.y += by.y;
        }
    }

    fn stars_mut(&mut self) -> Option<&mut TilingSprite> {
        match self.core.stage_mut().get_mut(self.stars) {
            Some(Node::Tiling(stars)) => Some(stars),
            _ => None,
        }
    }
}

impl View for GameView {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn update(&mut self) {
        self.move_stars(STAR_DRIFT);
    }
}
